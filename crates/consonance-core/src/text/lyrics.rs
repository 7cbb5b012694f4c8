//! Lyric cleaning and tokenizing.
//!
//! Raw lyric text from a provider is lowercased, stripped of bracketed
//! annotations such as `[Chorus]` or `(x2)`, and split into word tokens in
//! the Penn Treebank manner: contractions become their own tokens (`don't`
//! -> `do`, `n't`) and punctuation is split off. Punctuation-only tokens are
//! dropped before counting.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::TokenCounts;

/// Bracketed annotations, matched non-greedily within a single line.
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(\[].*?[\)\]]").expect("valid annotation regex"));

/// Punctuation that always stands alone. Apostrophes and single hyphens
/// stay attached so contractions and hyphenated words survive this pass.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(--|[^\w\s'-])"#).expect("valid punctuation regex"));

static CONTRACTION_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^' ])('s|'m|'d|') ").expect("valid contraction regex"));

static CONTRACTION_LONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^' ])('ll|'re|'ve|n't) ").expect("valid contraction regex"));

/// Lowercase lyrics, remove bracketed annotations and drop blank lines.
#[must_use]
pub fn clean_lyrics(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = ANNOTATION.replace_all(&lowered, "");
    stripped
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split text into word tokens, dropping punctuation-only tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let spaced = PUNCTUATION.replace_all(text, " $1 ");
    let mut padded = spaced.replace(['\n', '\t', '\r'], " ");
    padded.push(' ');
    let split = CONTRACTION_LONG.replace_all(&padded, "$1 $2 ");
    let split = CONTRACTION_SHORT.replace_all(&split, "$1 $2 ");

    split
        .split_whitespace()
        .filter(|token| !is_punctuation(token))
        .map(str::to_string)
        .collect()
}

/// Clean, tokenize and count raw lyric text.
#[must_use]
pub fn lyric_token_counts(raw: &str) -> TokenCounts {
    TokenCounts::from_tokens(tokenize(&clean_lyrics(raw)))
}

fn is_punctuation(token: &str) -> bool {
    !token.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lyrics_strips_annotations_and_blank_lines() {
        let raw = "[Verse 1]\nHey, I was doing just fine before I met you\n\n(x2)\nI drink too much";
        let cleaned = clean_lyrics(raw);
        assert_eq!(
            cleaned,
            "hey, i was doing just fine before i met you\ni drink too much"
        );
    }

    #[test]
    fn test_clean_lyrics_annotation_is_non_greedy() {
        let cleaned = clean_lyrics("keep (drop) keep [drop] keep");
        assert_eq!(cleaned, "keep  keep  keep");
    }

    #[test]
    fn test_tokenize_splits_punctuation() {
        let tokens = tokenize("hey, i was fine!");
        assert_eq!(tokens, vec!["hey", "i", "was", "fine"]);
    }

    #[test]
    fn test_tokenize_splits_contractions() {
        let tokens = tokenize("don't you know i'm here and you'll stay");
        assert_eq!(
            tokens,
            vec!["do", "n't", "you", "know", "i", "'m", "here", "and", "you", "'ll", "stay"]
        );
    }

    #[test]
    fn test_tokenize_keeps_hyphenated_words() {
        let tokens = tokenize("a well-known -- song");
        assert_eq!(tokens, vec!["a", "well-known", "song"]);
    }

    #[test]
    fn test_tokenize_drops_punctuation_only_tokens() {
        let tokens = tokenize("... ?! \" '' ``");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_lyric_token_counts() {
        let counts = lyric_token_counts("[Chorus]\nLove, love\nyou\n\nLOVE");
        assert_eq!(counts.get("love"), 3);
        assert_eq!(counts.get("you"), 1);
        assert_eq!(counts.get("chorus"), 0);
    }

    #[test]
    fn test_empty_lyrics() {
        assert!(lyric_token_counts("").is_empty());
    }
}
