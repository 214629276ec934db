use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use trackrec::{IndexStrategy, NumericFormat, StopWords};

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Parser)]
#[command(
    name = "trackrec",
    version,
    about = "Content-based track recommendations for playlist catalogs"
)]
pub struct Cli {
    /// MPD slice file, or a directory searched recursively for `*.json` slices.
    #[arg(env = "TRACKREC_CATALOG")]
    pub catalog: PathBuf,

    /// Track name to get recommendations for. Repeatable; when omitted,
    /// queries are read from stdin, one per line.
    #[arg(short, long = "query", env = "TRACKREC_QUERY")]
    pub queries: Vec<String>,

    /// Number of recommendations per query.
    #[arg(short = 'n', long, env = "TRACKREC_TOP_N", default_value_t = 10)]
    pub top_n: usize,

    /// Stop-word set removed before weighting (`english` or `none`).
    #[arg(long, env = "TRACKREC_STOP_WORDS", default_value_t = StopWords::English)]
    pub stop_words: StopWords,

    /// Rendering of numeric signals (`shortest` or `fixed:<digits>`).
    #[arg(long, env = "TRACKREC_NUMERIC_FORMAT", default_value_t = NumericFormat::Shortest)]
    pub numeric_format: NumericFormat,

    /// Similarity index (`auto`, `auto:<max>`, `dense` or `on-demand`).
    #[arg(long = "index", env = "TRACKREC_INDEX", default_value = "auto")]
    pub index_strategy: IndexStrategy,

    /// Weight terms by `1 + ln(tf)` instead of raw counts.
    #[arg(long, env = "TRACKREC_SUBLINEAR_TF")]
    pub sublinear_tf: bool,

    /// Leave the queried title out of its own results.
    #[arg(long, env = "TRACKREC_EXCLUDE_SEED")]
    pub exclude_seed: bool,

    /// Reference time for playlist ages (RFC 3339). Defaults to now.
    #[arg(long, env = "TRACKREC_NOW", value_parser = parse_reference_time)]
    pub now: Option<DateTime<Utc>>,

    /// Output results as JSON lines (NDJSON).
    #[arg(long, env = "TRACKREC_JSON")]
    pub json: bool,
}

fn parse_reference_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp such as 2017-11-01T00:00:00Z: {e}"))
}
