use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A lyric token multiset: token -> number of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCounts(BTreeMap<String, u32>);

impl TokenCounts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count occurrences of each token.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = Self::new();
        for token in tokens {
            counts.add(token, 1);
        }
        counts
    }

    /// Add `n` occurrences of `token`.
    pub fn add(&mut self, token: impl Into<String>, n: u32) {
        if n == 0 {
            return;
        }
        *self.0.entry(token.into()).or_insert(0) += n;
    }

    #[must_use]
    pub fn get(&self, token: &str) -> u32 {
        self.0.get(token).copied().unwrap_or(0)
    }

    /// Iterate distinct tokens and their counts in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.0.iter().map(|(t, &n)| (t.as_str(), n))
    }

    /// Number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of token occurrences.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().map(|&n| u64::from(n)).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for TokenCounts {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (token, n) in iter {
            counts.add(token, n);
        }
        counts
    }
}
