//! Lyrical similarity: sparse TF-IDF cosine over the inverted index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use consonance_core::text::Stopwords;
use consonance_core::{SongId, TokenCounts};

use crate::index::{IdfTable, IndexBuilder, IndexOptions, InvertedIndex, SongNorms};
use crate::similarity::cosine;
use crate::ScoreMap;

/// Everything needed to score lyrics against the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LyricIndex {
    pub index: InvertedIndex,
    pub idf: IdfTable,
    pub norms: SongNorms,
    /// Number of lyric documents the IDF values were computed over.
    pub n_docs: usize,
}

impl LyricIndex {
    /// Build the inverted index, IDF table, and song norms in one pass.
    pub fn build<'a, I>(documents: I, options: &IndexOptions, stopwords: Stopwords) -> Self
    where
        I: IntoIterator<Item = (&'a SongId, &'a TokenCounts)>,
        I::IntoIter: Clone,
    {
        let documents = documents.into_iter();
        let n_docs = documents.clone().count();
        let index = IndexBuilder::new(stopwords, options.remove_stopwords).build(documents.clone());
        let idf = IdfTable::compute(&index, n_docs, options);
        let norms = SongNorms::compute(&index, &idf, documents.map(|(id, _)| id));

        log::info!(
            "Indexed {} lyric documents: {} tokens, {} with IDF",
            n_docs,
            index.len(),
            idf.len()
        );

        Self {
            index,
            idf,
            norms,
            n_docs,
        }
    }

    /// Cosine similarity of `query` against every song sharing at least one
    /// IDF-eligible token with it.
    ///
    /// Songs sharing no eligible token are absent from the result and
    /// implicitly score 0. Work is proportional to the query's tokens times
    /// their posting lengths, not to the corpus size.
    #[must_use]
    pub fn score(&self, query: &TokenCounts) -> ScoreMap {
        let mut query_weights: Vec<(&str, f64, f64)> = Vec::with_capacity(query.len());
        let mut query_norm_sq = 0.0;
        for (token, count) in query.iter() {
            if let Some(idf) = self.idf.get(token) {
                let tfidf = f64::from(count) * idf;
                query_norm_sq += tfidf * tfidf;
                query_weights.push((token, idf, tfidf));
            }
        }
        let query_norm = query_norm_sq.sqrt();

        let mut dots: HashMap<SongId, f64> = HashMap::new();
        for (token, idf, query_tfidf) in query_weights {
            for posting in self.index.postings(token) {
                *dots.entry(posting.song.clone()).or_insert(0.0) +=
                    f64::from(posting.tf) * idf * query_tfidf;
            }
        }

        dots.into_iter()
            .map(|(song, dot)| {
                let score = cosine(dot, self.norms.get(&song), query_norm);
                (song, score)
            })
            .collect()
    }
}
