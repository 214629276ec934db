//! Error types for the `trackrec` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or querying a recommender.
#[derive(Debug, Error)]
pub enum RecError {
    /// A record at the ingestion boundary is missing a field or is inconsistent.
    #[error("Malformed input ({context}): {message}")]
    MalformedInput {
        /// Where the bad record was found (file path, playlist id, ...).
        context: String,
        /// A description of the problem.
        message: String,
    },

    /// A playlist declares zero tracks, so its diversity score is undefined.
    #[error("Division by zero: playlist {playlist_id} has num_tracks = 0")]
    DivisionByZero {
        /// The offending playlist.
        playlist_id: u64,
    },

    /// A track instance references a playlist with no computed signals.
    #[error("No playlist signals for playlist {playlist_id}")]
    MissingSignal {
        /// The playlist id that could not be joined.
        playlist_id: u64,
    },

    /// A query track name has no match in the corpus after normalization.
    #[error("Track not found: '{query}'")]
    NotFound {
        /// The query as supplied by the caller.
        query: String,
    },

    /// Vectorization or indexing was attempted over zero track instances.
    #[error("Cannot build a vector space over an empty corpus")]
    EmptyCorpus,

    /// A track instance index is outside the similarity index.
    #[error("Index {index} out of range for {len} track instances")]
    IndexOutOfRange {
        /// The requested row or column.
        index: usize,
        /// The number of track instances in the index.
        len: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reading catalog data failed.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl RecError {
    pub(crate) fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput { context: context.into(), message: message.into() }
    }
}

/// A convenience result type for recommender operations.
pub type Result<T> = std::result::Result<T, RecError>;
