//! Composite feature strings.
//!
//! Each track instance is turned into one line of text that the vectorizer
//! tokenizes: normalized track name, normalized artist name, raw album name,
//! then the two normalized playlist signals rendered as text, joined by a
//! single space. The numeric renderings become pseudo-tokens, so the chosen
//! [`NumericFormat`] directly shapes the vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecError;
use crate::signals::FeaturedTrack;

/// Separator between fields of a composite feature string.
pub const FIELD_SEPARATOR: &str = " ";

/// Text rendering of the numeric signals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NumericFormat {
    /// Shortest decimal that round-trips the `f64` (Rust `Display`), e.g.
    /// `-0.5390954527326813`, `1.25`, `0`.
    #[default]
    Shortest,
    /// Fixed-point with the given number of fractional digits.
    Fixed(u8),
}

impl NumericFormat {
    /// Render `value`. Negative zero, and fixed-point values that round to
    /// zero, are rendered without a sign.
    pub fn render(self, value: f64) -> String {
        let value = if value == 0.0 { 0.0 } else { value };
        let text = match self {
            Self::Shortest => value.to_string(),
            Self::Fixed(precision) => format!("{value:.prec$}", prec = usize::from(precision)),
        };
        match text.strip_prefix('-') {
            Some(unsigned) if unsigned.chars().all(|c| c == '0' || c == '.') => {
                unsigned.to_string()
            }
            _ => text,
        }
    }
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shortest => write!(f, "shortest"),
            Self::Fixed(precision) => write!(f, "fixed:{precision}"),
        }
    }
}

impl FromStr for NumericFormat {
    type Err = RecError;

    /// Parses `shortest` or `fixed:<digits>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("shortest") {
            return Ok(Self::Shortest);
        }
        s.strip_prefix("fixed:")
            .and_then(|digits| digits.parse::<u8>().ok())
            .filter(|&p| p <= 17)
            .map(Self::Fixed)
            .ok_or_else(|| {
                RecError::ConfigError(format!(
                    "invalid numeric format '{s}', expected 'shortest' or 'fixed:<0-17>'"
                ))
            })
    }
}

/// Build the composite feature string for one featured track.
pub fn compose(track: &FeaturedTrack, format: NumericFormat) -> String {
    let instance = &track.instance;
    let diversity = format.render(track.normalized_diversity_score);
    let age = format.render(track.normalized_playlist_age);
    [
        instance.track_name.as_str(),
        instance.artist_name.as_str(),
        instance.album_name.as_str(),
        diversity.as_str(),
        age.as_str(),
    ]
    .join(FIELD_SEPARATOR)
}
