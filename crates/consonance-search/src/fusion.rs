//! Weighted fusion of lyric and audio scores, ranking, and result selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use consonance_core::text::fuzzy_match;
use consonance_core::{Song, SongId};

use crate::error::{Error, Result};
use crate::ScoreMap;

/// Which songs are eligible for fusion when lyrics are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSet {
    /// Every song in either score map; a missing score counts as 0.
    #[default]
    Union,
    /// Only songs sharing an IDF-eligible token with the query lyrics.
    LyricsOnly,
}

/// A song's fused score and the signals it was fused from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSong {
    pub id: SongId,
    pub score: f64,
    pub audio: f64,
    /// `None` when lyrics were not considered (weight 0).
    pub lyrics: Option<f64>,
}

/// Check that a lyrics weight lies in `[0, 1]`.
///
/// # Errors
/// Returns [`Error::InvalidWeight`] for NaN or out-of-range weights.
pub fn validate_weight(weight: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err(Error::InvalidWeight(weight))
    }
}

/// Combine audio and lyric scores as `audio * (1 - w) + lyrics * w`.
///
/// With `weight == 0` (or no lyric scores) songs are scored by audio alone
/// and `lyrics` is `None` on every result.
///
/// # Errors
/// Returns [`Error::InvalidWeight`] for NaN or out-of-range weights.
pub fn fuse(
    audio: &ScoreMap,
    lyrics: Option<&ScoreMap>,
    weight: f64,
    candidates: CandidateSet,
) -> Result<Vec<ScoredSong>> {
    let weight = validate_weight(weight)?;
    let lyrics = match lyrics {
        Some(lyrics) if weight > 0.0 => lyrics,
        _ => {
            return Ok(audio
                .iter()
                .map(|(id, &score)| ScoredSong {
                    id: id.clone(),
                    score,
                    audio: score,
                    lyrics: None,
                })
                .collect());
        }
    };

    let ids: BTreeSet<&SongId> = match candidates {
        CandidateSet::Union => audio.keys().chain(lyrics.keys()).collect(),
        CandidateSet::LyricsOnly => lyrics.keys().collect(),
    };

    Ok(ids
        .into_iter()
        .map(|id| {
            let a = audio.get(id).copied().unwrap_or(0.0);
            let l = lyrics.get(id).copied().unwrap_or(0.0);
            ScoredSong {
                id: id.clone(),
                score: a * (1.0 - weight) + l * weight,
                audio: a,
                lyrics: Some(l),
            }
        })
        .collect())
}

/// Sort by descending score, breaking ties by ascending song id.
pub fn rank(scored: &mut [ScoredSong]) {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}

/// The query song, used to keep it and its alternate versions out of its
/// own results.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion<'a> {
    pub id: &'a SongId,
    pub artist: &'a str,
    pub title: &'a str,
}

impl Exclusion<'_> {
    /// Whether `song` is the query itself or another recording of it
    /// (artist and title both fuzzy-match).
    #[must_use]
    pub fn excludes(&self, song: &Song) -> bool {
        &song.id == self.id
            || (fuzzy_match(&song.artist, self.artist) && fuzzy_match(&song.title, self.title))
    }
}

/// Walk `ranked` in order and keep the first `n` songs that survive the
/// exclusion.
///
/// `lookup` maps ids to song records; ids it cannot resolve are skipped.
/// Filtering happens during the walk, so excluded songs never take up a
/// result slot.
pub fn select_top<'s, F>(
    ranked: &[ScoredSong],
    n: usize,
    exclusion: &Exclusion<'_>,
    lookup: F,
) -> Vec<(&'s Song, ScoredSong)>
where
    F: Fn(&SongId) -> Option<&'s Song>,
{
    let mut selected = Vec::with_capacity(n.min(ranked.len()));
    for scored in ranked {
        if selected.len() >= n {
            break;
        }
        let Some(song) = lookup(&scored.id) else {
            log::debug!("Skipping {}: no song record in corpus", scored.id);
            continue;
        };
        if exclusion.excludes(song) {
            continue;
        }
        selected.push((song, scored.clone()));
    }
    selected
}
