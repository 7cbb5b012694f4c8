//! Runs one resolved query through scoring, fusion, and ranking.

use std::sync::Arc;

use consonance_core::{Query, Song};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::fusion::{self, CandidateSet, Exclusion};

/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub song: Song,
    /// Fused score used for ranking.
    pub score: f64,
    pub audio_score: f64,
    /// Lyric similarity, `None` when lyrics were weighted 0.
    pub lyric_score: Option<f64>,
}

/// Read-only ranking engine over a shared [`Corpus`].
///
/// Cloning is cheap; clones share the corpus.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    corpus: Arc<Corpus>,
    candidates: CandidateSet,
}

impl SimilarityEngine {
    #[must_use]
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self {
            corpus,
            candidates: CandidateSet::default(),
        }
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: CandidateSet) -> Self {
        self.candidates = candidates;
        self
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub const fn candidates(&self) -> CandidateSet {
        self.candidates
    }

    /// Rank corpus songs by similarity to `query`.
    ///
    /// `lyrics_weight` is the share given to lyric similarity (the rest goes
    /// to audio similarity). At weight 0 lyrics are not scored at all. The
    /// query song and alternate recordings of it never appear in the
    /// results, which hold at most `n_results` entries.
    ///
    /// # Errors
    /// Returns [`Error::InvalidWeight`] for a weight outside `[0, 1]` and
    /// [`Error::LyricsRequired`] when lyrics are weighted but the query has
    /// none.
    pub fn recommend(
        &self,
        query: &Query,
        lyrics_weight: f64,
        n_results: usize,
    ) -> Result<Vec<Recommendation>> {
        let weight = fusion::validate_weight(lyrics_weight)?;
        let corpus = &*self.corpus;

        let mut fused = if weight == 0.0 {
            let audio = corpus.audio.score(&query.features, None)?;
            fusion::fuse(&audio, None, weight, self.candidates)?
        } else {
            let lyrics = query.lyrics.as_ref().ok_or(Error::LyricsRequired)?;
            let lyric_scores = corpus.lyrics.score(lyrics);
            let audio = match self.candidates {
                CandidateSet::Union => corpus.audio.score(&query.features, None)?,
                CandidateSet::LyricsOnly => {
                    let mut rows = corpus.audio.rows_of(lyric_scores.keys());
                    rows.sort_unstable();
                    corpus.audio.score(&query.features, Some(&rows))?
                }
            };
            log::debug!(
                "Scored {} lyric and {} audio candidates for {}",
                lyric_scores.len(),
                audio.len(),
                query.id
            );
            fusion::fuse(&audio, Some(&lyric_scores), weight, self.candidates)?
        };

        fusion::rank(&mut fused);

        let exclusion = Exclusion {
            id: &query.id,
            artist: &query.artist,
            title: &query.title,
        };
        let selected = fusion::select_top(&fused, n_results, &exclusion, |id| corpus.song(id));

        Ok(selected
            .into_iter()
            .map(|(song, scored)| Recommendation {
                song: song.clone(),
                score: scored.score,
                audio_score: scored.audio,
                lyric_score: scored.lyrics,
            })
            .collect())
    }
}
