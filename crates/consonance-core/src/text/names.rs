//! Artist and title normalization for fuzzy matching.
//!
//! Providers and datasets disagree on casing, punctuation, diacritics, and
//! featured-artist or version decorations. Two names "fuzzy-match" when,
//! after normalization, one equals or contains the other.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Parenthetical or bracketed decorations: "(feat. X)", "[Remastered]".
static DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\(\[][^\)\]]*[\)\]]").expect("valid decoration regex"));

/// Dash-separated version suffixes: "Closer - Radio Edit".
static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—]\s+.*$").expect("valid suffix regex"));

/// Case-fold, strip diacritics, and reduce punctuation to single spaces.
///
/// ```
/// use consonance_core::text::normalize_name;
///
/// assert_eq!(normalize_name("  Beyoncé & JAY-Z "), "beyonce jay z");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether two names refer to the same artist or title.
///
/// Normalized names match when equal or when either contains the other.
/// A name that normalizes to nothing never matches.
#[must_use]
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Remove version decorations from a track title.
///
/// Drops bracketed segments and everything after a spaced dash, so
/// "Closer (feat. Halsey) - Radio Edit" becomes "Closer". A title that
/// would be stripped to nothing is returned trimmed but otherwise intact.
#[must_use]
pub fn strip_name(title: &str) -> String {
    let undecorated = DECORATION.replace_all(title, "");
    let stripped = VERSION_SUFFIX.replace(&undecorated, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        title.trim().to_string()
    } else {
        stripped.to_string()
    }
}

/// Parse an `artist | title` query into lowercased, trimmed parts.
///
/// # Errors
/// Returns [`Error::InvalidData`] when the separator is missing or either
/// side is blank.
pub fn parse_artist_title(query: &str) -> Result<(String, String)> {
    let (artist, title) = query
        .split_once('|')
        .ok_or_else(|| Error::InvalidData(format!("expected 'artist | title', got '{query}'")))?;
    let artist = artist.trim().to_lowercase();
    let title = title.trim().to_lowercase();
    if artist.is_empty() || title.is_empty() {
        return Err(Error::InvalidData(format!(
            "artist and title must both be non-empty in '{query}'"
        )));
    }
    Ok((artist, title))
}
