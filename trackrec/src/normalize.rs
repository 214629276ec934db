//! Text normalization for track and artist names.
//!
//! [`normalize`] lowercases its input and strips every character that is not
//! a word character or whitespace. "Word character" is the Unicode `\w` class
//! of the `regex` crate: alphabetic characters, combining marks, decimal
//! digits, connector punctuation (`_`) and join controls. Accented names such
//! as "Beyoncé" therefore survive as "beyoncé".
//!
//! The same function is applied to the corpus and to incoming queries; the
//! query service never normalizes any other way.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s]").expect("unreachable error: failed to compile normalization pattern")
});

/// Lowercase `text` and remove everything except word characters and whitespace.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
///
/// ```
/// use trackrec::normalize;
///
/// assert_eq!(normalize("Ran$om!"), "ranom");
/// assert_eq!(normalize("Lil Tecca"), "lil tecca");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_WORD.replace_all(&lowered, "").into_owned()
}
