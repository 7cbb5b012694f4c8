//! Inverted lyric index, IDF table, and per-song TF-IDF norms.
//!
//! The index is built once from every song's token counts. Document
//! frequency thresholds decide which tokens get an IDF value at all; a
//! token without one is permanently out of scoring and contributes nothing
//! to any song's norm.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use consonance_core::text::Stopwords;
use consonance_core::{SongId, TokenCounts};

/// Tunables for building the lyric index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Skip stopwords and tokens containing non-alphabetic characters.
    pub remove_stopwords: bool,

    /// Minimum number of songs a token must appear in.
    pub min_df: usize,

    /// Maximum share of songs a token may appear in (0.0 to 1.0).
    pub max_df_ratio: f64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            remove_stopwords: true,
            min_df: 1,
            max_df_ratio: 1.0,
        }
    }
}

/// One entry of a token's posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub song: SongId,
    /// Raw occurrences of the token in the song.
    pub tf: u32,
}

/// Token -> posting list, plus a token -> dense integer vocabulary.
///
/// A song appears at most once in any token's posting list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<Posting>>,
    vocabulary: BTreeMap<String, usize>,
}

impl InvertedIndex {
    /// Posting list for `token` (empty when the token is not indexed).
    #[must_use]
    pub fn postings(&self, token: &str) -> &[Posting] {
        self.postings.get(token).map_or(&[], Vec::as_slice)
    }

    /// Number of songs containing `token`.
    #[must_use]
    pub fn document_frequency(&self, token: &str) -> usize {
        self.postings(token).len()
    }

    /// Iterate tokens with their posting lists in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Posting])> + '_ {
        self.postings
            .iter()
            .map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    /// Dense index of `token` in first-seen order.
    #[must_use]
    pub fn vocab_index(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    /// The vocabulary ordered by its dense index.
    #[must_use]
    pub fn vocabulary(&self) -> Vec<(&str, usize)> {
        let mut vocab: Vec<(&str, usize)> = self
            .vocabulary
            .iter()
            .map(|(t, &ix)| (t.as_str(), ix))
            .collect();
        vocab.sort_by_key(|&(_, ix)| ix);
        vocab
    }

    /// Number of distinct indexed tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Builds an [`InvertedIndex`] from per-song token counts.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    stopwords: Stopwords,
    remove_stopwords: bool,
}

impl IndexBuilder {
    /// Create a builder.
    ///
    /// When `remove_stopwords` is set, tokens in `stopwords` and tokens with
    /// any non-alphabetic character are left out of the index.
    #[must_use]
    pub fn new(stopwords: Stopwords, remove_stopwords: bool) -> Self {
        Self {
            stopwords,
            remove_stopwords,
        }
    }

    /// Index every song's distinct tokens.
    ///
    /// Vocabulary indices are assigned in the order tokens are first seen
    /// while walking `documents` in iteration order.
    pub fn build<'a, I>(&self, documents: I) -> InvertedIndex
    where
        I: IntoIterator<Item = (&'a SongId, &'a TokenCounts)>,
    {
        let mut index = InvertedIndex::default();
        for (song, counts) in documents {
            for (token, tf) in counts.iter() {
                if tf == 0 || !self.is_indexable(token) {
                    continue;
                }
                index
                    .postings
                    .entry(token.to_string())
                    .or_default()
                    .push(Posting {
                        song: song.clone(),
                        tf,
                    });
                let next = index.vocabulary.len();
                index.vocabulary.entry(token.to_string()).or_insert(next);
            }
        }
        index
    }

    fn is_indexable(&self, token: &str) -> bool {
        if !self.remove_stopwords {
            return true;
        }
        !token.is_empty() && token.chars().all(char::is_alphabetic) && !self.stopwords.contains(token)
    }
}

/// Inverse document frequency for tokens that pass the df thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdfTable(BTreeMap<String, f64>);

impl IdfTable {
    /// Compute `idf = log2(n_docs / (1 + df))` for every token with
    /// `df >= min_df` and `df / n_docs <= max_df_ratio`.
    ///
    /// Tokens outside the thresholds are absent from the table. An empty
    /// corpus (`n_docs == 0`) yields an empty table.
    #[must_use]
    pub fn compute(index: &InvertedIndex, n_docs: usize, options: &IndexOptions) -> Self {
        if n_docs == 0 {
            return Self::default();
        }
        let n = n_docs as f64;
        let table = index
            .iter()
            .filter_map(|(token, postings)| {
                let df = postings.len();
                let eligible = df >= options.min_df && (df as f64 / n) <= options.max_df_ratio;
                eligible.then(|| (token.to_string(), (n / (1.0 + df as f64)).log2()))
            })
            .collect();
        Self(table)
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<f64> {
        self.0.get(token).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(t, &idf)| (t.as_str(), idf))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// L2 norm of each song's TF-IDF vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongNorms(HashMap<SongId, f64>);

impl SongNorms {
    /// Accumulate `(tf * idf)^2` over IDF-eligible tokens for each song.
    ///
    /// Every song in `songs` gets an entry; songs with no eligible token
    /// have norm 0.
    pub fn compute<'a, I>(index: &InvertedIndex, idf: &IdfTable, songs: I) -> Self
    where
        I: IntoIterator<Item = &'a SongId>,
    {
        let mut sums: HashMap<SongId, f64> = songs.into_iter().map(|id| (id.clone(), 0.0)).collect();
        for (token, weight) in idf.iter() {
            for posting in index.postings(token) {
                let tfidf = f64::from(posting.tf) * weight;
                *sums.entry(posting.song.clone()).or_insert(0.0) += tfidf * tfidf;
            }
        }
        Self(sums.into_iter().map(|(id, sum)| (id, sum.sqrt())).collect())
    }

    /// Norm for `song`, 0 when unknown.
    #[must_use]
    pub fn get(&self, song: &SongId) -> f64 {
        self.0.get(song).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> BTreeMap<SongId, TokenCounts> {
        let mut docs = BTreeMap::new();
        docs.insert(
            SongId::from("a"),
            [("love", 3), ("you", 2)].into_iter().collect(),
        );
        docs.insert(SongId::from("b"), [("love", 1)].into_iter().collect());
        docs
    }

    fn plain_builder() -> IndexBuilder {
        IndexBuilder::new(Stopwords::none(), false)
    }

    #[test]
    fn test_build_posting_lists() {
        let index = plain_builder().build(&docs());
        assert_eq!(index.len(), 2);
        assert_eq!(index.document_frequency("love"), 2);
        assert_eq!(
            index.postings("you"),
            &[Posting {
                song: SongId::from("a"),
                tf: 2
            }]
        );
        assert!(index.postings("absent").is_empty());
    }

    #[test]
    fn test_vocabulary_first_seen_order() {
        let index = plain_builder().build(&docs());
        assert_eq!(index.vocabulary(), vec![("love", 0), ("you", 1)]);
        assert_eq!(index.vocab_index("you"), Some(1));
        assert_eq!(index.vocab_index("absent"), None);
    }

    #[test]
    fn test_stopword_and_non_alpha_filtering() {
        let mut docs = BTreeMap::new();
        docs.insert(
            SongId::from("a"),
            [("the", 4), ("n't", 1), ("love", 1), ("24k", 2)]
                .into_iter()
                .collect(),
        );

        let filtered = IndexBuilder::new(Stopwords::english(), true).build(&docs);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.document_frequency("love"), 1);

        let unfiltered = IndexBuilder::new(Stopwords::english(), false).build(&docs);
        assert_eq!(unfiltered.len(), 4);
    }

    #[test]
    fn test_idf_formula() {
        let index = plain_builder().build(&docs());
        let idf = IdfTable::compute(&index, 2, &IndexOptions::default());
        let love = idf.get("love").unwrap();
        let you = idf.get("you").unwrap();
        assert!((love - (2.0_f64 / 3.0).log2()).abs() < 1e-12);
        assert!(you.abs() < 1e-12);
    }

    #[test]
    fn test_idf_thresholds_exclude_tokens() {
        let index = plain_builder().build(&docs());

        let min_two = IndexOptions {
            min_df: 2,
            ..IndexOptions::default()
        };
        let idf = IdfTable::compute(&index, 2, &min_two);
        assert!(idf.get("love").is_some());
        assert!(idf.get("you").is_none());

        let max_half = IndexOptions {
            max_df_ratio: 0.5,
            ..IndexOptions::default()
        };
        let idf = IdfTable::compute(&index, 2, &max_half);
        assert!(idf.get("love").is_none());
        assert!(idf.get("you").is_some());
    }

    #[test]
    fn test_idf_empty_corpus() {
        let idf = IdfTable::compute(&InvertedIndex::default(), 0, &IndexOptions::default());
        assert!(idf.is_empty());
    }

    #[test]
    fn test_song_norms() {
        let docs = docs();
        let index = plain_builder().build(&docs);
        let idf = IdfTable::compute(&index, 2, &IndexOptions::default());
        let norms = SongNorms::compute(&index, &idf, docs.keys());

        let love = idf.get("love").unwrap();
        assert!((norms.get(&SongId::from("a")) - (3.0 * love).abs()).abs() < 1e-12);
        assert!((norms.get(&SongId::from("b")) - love.abs()).abs() < 1e-12);
    }

    #[test]
    fn test_song_without_eligible_tokens_has_zero_norm() {
        let mut docs = docs();
        docs.insert(SongId::from("c"), [("rare", 1)].into_iter().collect());
        let index = plain_builder().build(&docs);
        let min_two = IndexOptions {
            min_df: 2,
            ..IndexOptions::default()
        };
        let idf = IdfTable::compute(&index, 3, &min_two);
        let norms = SongNorms::compute(&index, &idf, docs.keys());

        assert_eq!(norms.len(), 3);
        assert_eq!(norms.get(&SongId::from("c")), 0.0);
        assert_eq!(norms.get(&SongId::from("unknown")), 0.0);
    }
}
