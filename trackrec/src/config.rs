//! Configuration for the recommender pipeline.

use serde::{Deserialize, Serialize};

use crate::compose::NumericFormat;
use crate::error::{RecError, Result};
use crate::index::IndexStrategy;
use crate::stopwords::StopWords;

/// Tokenization and weighting options for the TF-IDF space.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VectorizerConfig {
    /// Stop-word set removed before weighting.
    #[serde(default)]
    pub stop_words: StopWords,
    /// Use `1 + ln(tf)` instead of the raw term count.
    #[serde(default)]
    pub sublinear_tf: bool,
}

/// Configuration parameters for building and querying a
/// [`Recommender`](crate::Recommender).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommenderConfig {
    /// Number of results returned when the caller does not pass one.
    pub top_n: usize,
    /// Tokenization and weighting options.
    pub vectorizer: VectorizerConfig,
    /// How numeric signals are written into composite strings.
    pub numeric_format: NumericFormat,
    /// Similarity index layout.
    pub index_strategy: IndexStrategy,
    /// Whether the seed's own title may appear in its results.
    pub include_seed: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            vectorizer: VectorizerConfig::default(),
            numeric_format: NumericFormat::default(),
            index_strategy: IndexStrategy::default(),
            include_seed: true,
        }
    }
}

impl RecommenderConfig {
    /// Create a new builder for constructing a [`RecommenderConfig`].
    pub fn builder() -> RecommenderConfigBuilder {
        RecommenderConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RecommenderConfig`].
#[derive(Debug, Clone, Default)]
pub struct RecommenderConfigBuilder {
    config: RecommenderConfig,
}

impl RecommenderConfigBuilder {
    /// Set the default number of results per query.
    pub fn top_n(mut self, top_n: usize) -> Self {
        self.config.top_n = top_n;
        self
    }

    /// Set the stop-word set.
    pub fn stop_words(mut self, stop_words: StopWords) -> Self {
        self.config.vectorizer.stop_words = stop_words;
        self
    }

    /// Enable or disable sublinear term frequency.
    pub fn sublinear_tf(mut self, enabled: bool) -> Self {
        self.config.vectorizer.sublinear_tf = enabled;
        self
    }

    /// Set the numeric rendering used in composite strings.
    pub fn numeric_format(mut self, format: NumericFormat) -> Self {
        self.config.numeric_format = format;
        self
    }

    /// Set the similarity index strategy.
    pub fn index_strategy(mut self, strategy: IndexStrategy) -> Self {
        self.config.index_strategy = strategy;
        self
    }

    /// Keep or drop the seed's own title from results.
    pub fn include_seed(mut self, include: bool) -> Self {
        self.config.include_seed = include;
        self
    }

    /// Build the [`RecommenderConfig`], validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RecError::ConfigError`] if:
    /// - `top_n == 0`
    /// - the index strategy is `Auto { max_dense: 0 }`
    /// - a fixed numeric format asks for more than 17 digits
    pub fn build(self) -> Result<RecommenderConfig> {
        if self.config.top_n == 0 {
            return Err(RecError::ConfigError("top_n must be greater than zero".to_string()));
        }
        if let IndexStrategy::Auto { max_dense: 0 } = self.config.index_strategy {
            return Err(RecError::ConfigError(
                "max_dense must be greater than zero for the auto index strategy".to_string(),
            ));
        }
        if let NumericFormat::Fixed(precision) = self.config.numeric_format {
            if precision > 17 {
                return Err(RecError::ConfigError(format!(
                    "fixed numeric precision ({precision}) must be at most 17"
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = RecommenderConfig::default();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.vectorizer.stop_words, StopWords::English);
        assert!(!config.vectorizer.sublinear_tf);
        assert_eq!(config.numeric_format, NumericFormat::Shortest);
        assert_eq!(config.index_strategy, IndexStrategy::Auto { max_dense: 4096 });
        assert!(config.include_seed);
        assert_eq!(RecommenderConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn builder_sets_fields() {
        let config = RecommenderConfig::builder()
            .top_n(3)
            .stop_words(StopWords::None)
            .sublinear_tf(true)
            .numeric_format(NumericFormat::Fixed(4))
            .index_strategy(IndexStrategy::OnDemand)
            .include_seed(false)
            .build()
            .unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.vectorizer.stop_words, StopWords::None);
        assert!(config.vectorizer.sublinear_tf);
        assert_eq!(config.numeric_format, NumericFormat::Fixed(4));
        assert_eq!(config.index_strategy, IndexStrategy::OnDemand);
        assert!(!config.include_seed);
    }

    #[test]
    fn rejects_zero_top_n() {
        let err = RecommenderConfig::builder().top_n(0).build().unwrap_err();
        assert!(matches!(err, RecError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_max_dense() {
        let err = RecommenderConfig::builder()
            .index_strategy(IndexStrategy::Auto { max_dense: 0 })
            .build()
            .unwrap_err();
        assert!(matches!(err, RecError::ConfigError(_)));
    }

    #[test]
    fn rejects_excessive_precision() {
        let err = RecommenderConfig::builder()
            .numeric_format(NumericFormat::Fixed(40))
            .build()
            .unwrap_err();
        assert!(matches!(err, RecError::ConfigError(_)));
    }

    #[test]
    fn deserializes_from_json() {
        let config: RecommenderConfig = serde_json::from_str(
            r#"{
                "top_n": 5,
                "vectorizer": { "stop_words": "none" },
                "numeric_format": { "fixed": 3 },
                "index_strategy": "on_demand",
                "include_seed": false
            }"#,
        )
        .unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.vectorizer.stop_words, StopWords::None);
        assert_eq!(config.numeric_format, NumericFormat::Fixed(3));
        assert_eq!(config.index_strategy, IndexStrategy::OnDemand);
    }
}
