//! TF-IDF vector space over composite feature strings.
//!
//! **Weighting:**
//! ```text
//! w(t, d)  = tf(t, d) × idf(t)
//! tf(t, d) = count of t in d          (or 1 + ln(count) with sublinear_tf)
//! idf(t)   = ln((1 + N) / (1 + df(t))) + 1
//! ```
//! Each document vector is then scaled to unit L2 norm, so cosine similarity
//! is a plain dot product.
//!
//! Tokens are maximal runs of two or more word characters (`\b\w\w+\b`,
//! Unicode `\w` as in [`crate::normalize`]), lowercased, with the configured
//! stop words removed. Vocabulary indices follow sorted term order, so the same
//! ordered corpus always yields the same space.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::VectorizerConfig;
use crate::error::{RecError, Result};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\w\w+\b").expect("unreachable error: failed to compile token pattern")
});

/// Split `text` into lowercase tokens, dropping stop words.
pub fn tokenize(text: &str, config: &VectorizerConfig) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !config.stop_words.contains(t))
        .map(str::to_string)
        .collect()
}

/// A sparse vector with strictly increasing dimension indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Build from `(dimension, weight)` pairs sorted by dimension.
    fn from_sorted(entries: Vec<(u32, f32)>) -> Self {
        let (indices, values) = entries.into_iter().unzip();
        Self { indices, values }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Weight stored for `dimension`, zero if absent.
    pub fn get(&self, dimension: u32) -> f32 {
        self.indices.binary_search(&dimension).map(|i| self.values[i]).unwrap_or(0.0)
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product by merging the two index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Term to dimension mapping, in sorted term order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    fn from_sorted(terms: Vec<String>) -> Self {
        let index = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as u32)).collect();
        Self { terms, index }
    }

    /// Dimension of `term`, if it is in the vocabulary.
    pub fn get(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    /// Term stored at `dimension`.
    pub fn term(&self, dimension: u32) -> Option<&str> {
        self.terms.get(dimension as usize).map(String::as_str)
    }

    /// All terms, sorted; position is the dimension.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A fitted TF-IDF space: vocabulary, IDF weights and one vector per document.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    config: VectorizerConfig,
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    vectors: Vec<SparseVector>,
}

impl VectorSpace {
    /// Fit the space over `documents` and vectorize each of them.
    ///
    /// Document order is preserved: `vectors()[i]` belongs to `documents[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`RecError::EmptyCorpus`] if `documents` is empty.
    pub fn fit<S: AsRef<str> + Sync>(documents: &[S], config: &VectorizerConfig) -> Result<Self> {
        if documents.is_empty() {
            return Err(RecError::EmptyCorpus);
        }
        let n_docs = documents.len();

        let term_counts: Vec<HashMap<String, u32>> = documents
            .par_iter()
            .map(|doc| count_terms(tokenize(doc.as_ref(), config)))
            .collect();

        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = n_docs as f64;
        let idf: Vec<f32> = doc_freq
            .values()
            .map(|&df| (((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0) as f32)
            .collect();
        let vocabulary = Vocabulary::from_sorted(doc_freq.keys().map(|t| t.to_string()).collect());

        let mut space = Self { config: config.clone(), vocabulary, idf, vectors: Vec::new() };
        space.vectors = term_counts.par_iter().map(|counts| space.weigh(counts)).collect();

        let empty_documents = space.vectors.iter().filter(|v| v.is_empty()).count();
        if empty_documents > 0 {
            debug!(empty_documents, "documents with no terms after stop-word removal");
        }
        info!(documents = n_docs, vocabulary_size = space.vocabulary.len(), "fitted tf-idf space");

        Ok(space)
    }

    /// Project unseen text into the fitted space. Unknown terms are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&count_terms(tokenize(text, &self.config)))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// IDF weight per dimension.
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVector {
        let mut entries: Vec<(u32, f64)> = counts
            .iter()
            .filter_map(|(term, &count)| {
                let dim = self.vocabulary.get(term)?;
                let tf = if self.config.sublinear_tf {
                    1.0 + f64::from(count).ln()
                } else {
                    f64::from(count)
                };
                Some((dim, tf * f64::from(self.idf[dim as usize])))
            })
            .collect();
        entries.sort_unstable_by_key(|&(dim, _)| dim);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return SparseVector::default();
        }
        SparseVector::from_sorted(
            entries.into_iter().map(|(d, w)| (d, (w / norm) as f32)).collect(),
        )
    }
}

fn count_terms(tokens: Vec<String>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}
