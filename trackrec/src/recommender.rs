//! The query service and the build pipeline behind it.
//!
//! A [`Recommender`] runs every stage once at build time
//! (normalize → aggregate → join → compose → vectorize → index) and is
//! immutable afterwards, so it can be shared across threads behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use trackrec::{Catalog, Playlist, Recommender, Track};
//!
//! let catalog = Catalog::new(vec![
//!     Playlist::new(1, "rap", 2, 1_500_000_000)
//!         .with_track(Track::new("Ransom", "Lil Tecca", "We Love You Tecca", 131_240))
//!         .with_track(Track::new("Lucid Dreams", "Juice WRLD", "Death Race for Love", 239_836)),
//! ]);
//!
//! let recommender = Recommender::builder().build(&catalog)?;
//! let results = recommender.recommend("RANSOM!!", 5)?;
//! assert_eq!(results.items[0].track_name, "ransom");
//! # Ok::<(), trackrec::RecError>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, normalize_tracks};
use crate::compose::compose;
use crate::config::RecommenderConfig;
use crate::error::{RecError, Result};
use crate::index::{SimilarityIndex, build_index, sort_descending};
use crate::normalize::normalize;
use crate::signals::{FeaturedTrack, SignalTable, aggregate, join};
use crate::vectorize::VectorSpace;

/// One recommended track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Normalized track name.
    pub track_name: String,
    /// Normalized artist name.
    pub artist_name: String,
    /// Raw album name.
    pub album_name: String,
    /// Cosine similarity to the seed, in `[0, 1]`.
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_uri: Option<String>,
}

/// The answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSet {
    /// The query as supplied.
    pub query: String,
    /// Index of the track instance the query resolved to; `None` when the
    /// query matched nothing.
    pub seed: Option<usize>,
    /// Results in rank order.
    pub items: Vec<Recommendation>,
}

impl RecommendationSet {
    fn not_found(query: &str) -> Self {
        Self { query: query.to_string(), seed: None, items: Vec::new() }
    }

    /// Returns `true` if the query did not match any track.
    pub fn is_not_found(&self) -> bool {
        self.seed.is_none()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A built, queryable recommender.
///
/// Construct one via [`Recommender::builder()`].
pub struct Recommender {
    config: RecommenderConfig,
    signals: SignalTable,
    tracks: Vec<FeaturedTrack>,
    composites: Vec<String>,
    space: Arc<VectorSpace>,
    index: Arc<dyn SimilarityIndex>,
    /// Normalized track name to its first instance.
    first_by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("config", &self.config)
            .field("instances", &self.tracks.len())
            .field("vocabulary_size", &self.space.vocabulary().len())
            .finish_non_exhaustive()
    }
}

impl Recommender {
    /// Create a new [`RecommenderBuilder`].
    pub fn builder() -> RecommenderBuilder {
        RecommenderBuilder::default()
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Per-playlist signals computed at build time.
    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Featured track instances, in ingestion order.
    pub fn tracks(&self) -> &[FeaturedTrack] {
        &self.tracks
    }

    /// Composite feature strings, aligned with [`Recommender::tracks`].
    pub fn composites(&self) -> &[String] {
        &self.composites
    }

    pub fn vector_space(&self) -> &VectorSpace {
        &self.space
    }

    pub fn index(&self) -> &Arc<dyn SimilarityIndex> {
        &self.index
    }

    /// Number of track instances.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Resolve `query` to the first track instance whose normalized name
    /// matches it.
    ///
    /// # Errors
    ///
    /// Returns [`RecError::NotFound`] if nothing matches.
    pub fn resolve(&self, query: &str) -> Result<usize> {
        self.first_by_name
            .get(&normalize(query))
            .copied()
            .ok_or_else(|| RecError::NotFound { query: query.to_string() })
    }

    /// Recommend up to [`RecommenderConfig::top_n`] tracks for `query`.
    pub fn recommend_default(&self, query: &str) -> Result<RecommendationSet> {
        self.recommend(query, self.config.top_n)
    }

    /// Recommend up to `top_n` tracks similar to the one named `query`.
    ///
    /// An unknown name yields an empty set with
    /// [`is_not_found`](RecommendationSet::is_not_found) set, not an error.
    /// Results never repeat a normalized track name.
    ///
    /// # Errors
    ///
    /// Returns [`RecError::ConfigError`] if `top_n == 0`.
    pub fn recommend(&self, query: &str, top_n: usize) -> Result<RecommendationSet> {
        if top_n == 0 {
            return Err(RecError::ConfigError("top_n must be greater than zero".to_string()));
        }

        // 1. Resolve the seed
        let seed = match self.resolve(query) {
            Ok(seed) => seed,
            Err(RecError::NotFound { .. }) => {
                warn!(query, "track not found");
                return Ok(RecommendationSet::not_found(query));
            }
            Err(e) => return Err(e),
        };

        // 2. Rank the seed's similarity row
        let mut row = self.index.similarity_row(seed)?;
        sort_descending(&mut row);

        // 3. Walk the ranking, one result per normalized name
        let mut seen: HashSet<&str> = HashSet::new();
        if !self.config.include_seed {
            seen.insert(self.tracks[seed].instance.track_name.as_str());
        }
        let mut items = Vec::with_capacity(top_n.min(self.len()));
        for (j, score) in row {
            if items.len() == top_n {
                break;
            }
            let instance = &self.tracks[j].instance;
            if !seen.insert(instance.track_name.as_str()) {
                continue;
            }
            items.push(Recommendation {
                track_name: instance.track_name.clone(),
                artist_name: instance.artist_name.clone(),
                album_name: instance.album_name.clone(),
                score,
                track_uri: instance.track_uri.clone(),
            });
        }

        debug!(query, seed, result_count = items.len(), "query completed");
        Ok(RecommendationSet { query: query.to_string(), seed: Some(seed), items })
    }
}

/// Builder for constructing a [`Recommender`] from a [`Catalog`].
///
/// Both fields are optional: the configuration defaults to
/// [`RecommenderConfig::default()`] and the reference time to the current
/// wall clock.
#[derive(Debug, Clone, Default)]
pub struct RecommenderBuilder {
    config: Option<RecommenderConfig>,
    reference_time: Option<DateTime<Utc>>,
}

impl RecommenderBuilder {
    /// Set the recommender configuration.
    pub fn config(mut self, config: RecommenderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Pin the "now" used for playlist ages.
    pub fn reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Run every stage over `catalog`.
    ///
    /// # Errors
    ///
    /// Propagates aggregation errors ([`RecError::DivisionByZero`],
    /// [`RecError::MalformedInput`], [`RecError::MissingSignal`]) and returns
    /// [`RecError::EmptyCorpus`] if the catalog holds no tracks. Playlist
    /// checks run first, so a broken playlist is reported even then.
    pub fn build(self, catalog: &Catalog) -> Result<Recommender> {
        let config = self.config.unwrap_or_default();
        let now = self.reference_time.unwrap_or_else(Utc::now);

        // 1. Normalize
        let instances = normalize_tracks(catalog);

        // 2. Aggregate and join playlist signals
        let signals = aggregate(catalog, &instances, now)?;
        if instances.is_empty() {
            return Err(RecError::EmptyCorpus);
        }
        let tracks = join(&instances, &signals)?;

        // 3. Compose
        let composites: Vec<String> =
            tracks.iter().map(|t| compose(t, config.numeric_format)).collect();

        // 4. Vectorize and index
        let space = Arc::new(VectorSpace::fit(&composites, &config.vectorizer)?);
        let index = build_index(Arc::clone(&space), config.index_strategy)?;

        let mut first_by_name = HashMap::new();
        for (i, track) in tracks.iter().enumerate() {
            first_by_name.entry(track.instance.track_name.clone()).or_insert(i);
        }

        info!(
            playlist_count = catalog.playlist_count(),
            instance_count = tracks.len(),
            distinct_names = first_by_name.len(),
            vocabulary_size = space.vocabulary().len(),
            "recommender built"
        );

        Ok(Recommender { config, signals, tracks, composites, space, index, first_by_name })
    }
}
