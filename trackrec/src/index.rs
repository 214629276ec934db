//! Pairwise similarity over a fitted [`VectorSpace`].
//!
//! Cosine similarity of L2-normalized vectors is their dot product. The
//! diagonal is pinned to `1.0`, including for empty vectors, and every other
//! score is clamped to `[0, 1]`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RecError, Result};
use crate::vectorize::VectorSpace;

/// Default catalog size up to which [`IndexStrategy::Auto`] precomputes.
pub const DEFAULT_MAX_DENSE: usize = 4096;

/// Read access to pairwise similarity scores between track instances.
pub trait SimilarityIndex: Send + Sync {
    /// Number of indexed instances.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Score between instances `i` and `j`.
    fn similarity(&self, i: usize, j: usize) -> Result<f32>;

    /// All scores for instance `i`, as `(j, score)` in index order.
    fn similarity_row(&self, i: usize) -> Result<Vec<(usize, f32)>>;

    /// The `k` highest scores for instance `i`, descending. Ties keep index
    /// order.
    fn top_k(&self, i: usize, k: usize) -> Result<Vec<(usize, f32)>> {
        let mut row = self.similarity_row(i)?;
        sort_descending(&mut row);
        row.truncate(k);
        Ok(row)
    }
}

/// Stable sort by descending score.
pub fn sort_descending(row: &mut [(usize, f32)]) {
    row.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

fn check_bounds(index: usize, len: usize) -> Result<()> {
    if index < len { Ok(()) } else { Err(RecError::IndexOutOfRange { index, len }) }
}

fn score(space: &VectorSpace, i: usize, j: usize) -> f32 {
    if i == j {
        return 1.0;
    }
    let vectors = space.vectors();
    vectors[i].dot(&vectors[j]).clamp(0.0, 1.0)
}

/// Precomputed `N x N` similarity matrix, row-major.
#[derive(Debug, Clone)]
pub struct DenseSimilarityMatrix {
    len: usize,
    scores: Vec<f32>,
}

impl DenseSimilarityMatrix {
    /// Compute every pairwise score. Rows are built in parallel.
    pub fn build(space: &VectorSpace) -> Result<Self> {
        let len = space.len();
        if len == 0 {
            return Err(RecError::EmptyCorpus);
        }
        let rows: Vec<Vec<f32>> = (0..len)
            .into_par_iter()
            .map(|i| (0..len).map(|j| score(space, i, j)).collect())
            .collect();
        let scores = rows.into_iter().flatten().collect();
        info!(instances = len, "built dense similarity matrix");
        Ok(Self { len, scores })
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.scores[i * self.len..(i + 1) * self.len]
    }
}

impl SimilarityIndex for DenseSimilarityMatrix {
    fn len(&self) -> usize {
        self.len
    }

    fn similarity(&self, i: usize, j: usize) -> Result<f32> {
        check_bounds(i, self.len)?;
        check_bounds(j, self.len)?;
        Ok(self.row(i)[j])
    }

    fn similarity_row(&self, i: usize) -> Result<Vec<(usize, f32)>> {
        check_bounds(i, self.len)?;
        Ok(self.row(i).iter().copied().enumerate().collect())
    }
}

/// Computes each row from the stored vectors when it is asked for.
#[derive(Debug, Clone)]
pub struct OnDemandIndex {
    space: Arc<VectorSpace>,
}

impl OnDemandIndex {
    pub fn new(space: Arc<VectorSpace>) -> Result<Self> {
        if space.is_empty() {
            return Err(RecError::EmptyCorpus);
        }
        info!(instances = space.len(), "using on-demand similarity index");
        Ok(Self { space })
    }
}

impl SimilarityIndex for OnDemandIndex {
    fn len(&self) -> usize {
        self.space.len()
    }

    fn similarity(&self, i: usize, j: usize) -> Result<f32> {
        check_bounds(i, self.len())?;
        check_bounds(j, self.len())?;
        Ok(score(&self.space, i, j))
    }

    fn similarity_row(&self, i: usize) -> Result<Vec<(usize, f32)>> {
        check_bounds(i, self.len())?;
        Ok((0..self.len()).map(|j| (j, score(&self.space, i, j))).collect())
    }
}

/// Which [`SimilarityIndex`] implementation to build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Always build a [`DenseSimilarityMatrix`].
    Precomputed,
    /// Always use an [`OnDemandIndex`].
    OnDemand,
    /// Precompute when the catalog has at most `max_dense` instances.
    Auto { max_dense: usize },
}

impl Default for IndexStrategy {
    fn default() -> Self {
        Self::Auto { max_dense: DEFAULT_MAX_DENSE }
    }
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precomputed => write!(f, "dense"),
            Self::OnDemand => write!(f, "on-demand"),
            Self::Auto { max_dense } => write!(f, "auto:{max_dense}"),
        }
    }
}

impl FromStr for IndexStrategy {
    type Err = RecError;

    /// Parses `dense`, `on-demand`, `auto` or `auto:<max_dense>`.
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "dense" | "precomputed" => Ok(Self::Precomputed),
            "on-demand" | "on_demand" | "ondemand" => Ok(Self::OnDemand),
            "auto" => Ok(Self::default()),
            other => other
                .strip_prefix("auto:")
                .and_then(|n| n.parse::<usize>().ok())
                .map(|max_dense| Self::Auto { max_dense })
                .ok_or_else(|| {
                    RecError::ConfigError(format!(
                        "unknown index strategy '{s}', expected 'auto', 'dense' or 'on-demand'"
                    ))
                }),
        }
    }
}

/// Build the index selected by `strategy` over `space`.
///
/// # Errors
///
/// Returns [`RecError::EmptyCorpus`] if the space has no vectors.
pub fn build_index(
    space: Arc<VectorSpace>,
    strategy: IndexStrategy,
) -> Result<Arc<dyn SimilarityIndex>> {
    let dense = match strategy {
        IndexStrategy::Precomputed => true,
        IndexStrategy::OnDemand => false,
        IndexStrategy::Auto { max_dense } => space.len() <= max_dense,
    };
    debug!(%strategy, dense, instances = space.len(), "selecting similarity index");
    if dense {
        Ok(Arc::new(DenseSimilarityMatrix::build(&space)?))
    } else {
        Ok(Arc::new(OnDemandIndex::new(space)?))
    }
}
