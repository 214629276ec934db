//! # trackrec
//!
//! Content-based track recommendations over playlist catalogs.
//!
//! Every playlist-track occurrence is described by a short text built from
//! its normalized title and artist, its album, and two z-scored signals of
//! the playlist it sits in (artist/album diversity and age). Those texts are
//! embedded in a TF-IDF space and compared by cosine similarity; a query
//! returns the tracks whose descriptions are closest to the named one.
//!
//! ## Stages
//!
//! - [`normalize`] lowercases names and strips punctuation
//! - [`signals`] aggregates per-playlist diversity and age and z-scores them
//! - [`compose`] builds one composite feature string per track instance
//! - [`vectorize`] fits the TF-IDF [`VectorSpace`]
//! - [`index`] serves pairwise scores through a [`SimilarityIndex`]
//! - [`Recommender`] wires the stages together and answers queries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trackrec::{Recommender, RecommenderConfig, ingest};
//!
//! let catalog = ingest::load_catalog("data/mpd.slice.0-999.json")?;
//! let config = RecommenderConfig::builder().top_n(5).build()?;
//! let recommender = Recommender::builder().config(config).build(&catalog)?;
//!
//! for item in recommender.recommend_default("Ransom")?.items {
//!     println!("{} - {} ({:.3})", item.track_name, item.artist_name, item.score);
//! }
//! # Ok::<(), trackrec::RecError>(())
//! ```

pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod normalize;
pub mod recommender;
pub mod signals;
pub mod stopwords;
pub mod vectorize;

pub use catalog::{Catalog, Playlist, Track, TrackInstance, normalize_tracks};
pub use compose::{NumericFormat, compose};
pub use config::{RecommenderConfig, RecommenderConfigBuilder, VectorizerConfig};
pub use error::{RecError, Result};
pub use index::{
    DenseSimilarityMatrix, IndexStrategy, OnDemandIndex, SimilarityIndex, build_index,
};
pub use normalize::normalize;
pub use recommender::{Recommendation, RecommendationSet, Recommender, RecommenderBuilder};
pub use signals::{FeaturedTrack, PlaylistSignals, SignalTable, aggregate, join};
pub use stopwords::StopWords;
pub use vectorize::{SparseVector, VectorSpace, Vocabulary};
