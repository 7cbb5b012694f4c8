//! Audio-feature similarity: dense cosine over standardized descriptors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use consonance_core::{AudioFeatures, Song, SongId, FEATURE_COUNT};

use crate::error::Result;
use crate::matrix::FeatureMatrix;
use crate::scaler::StandardScaler;
use crate::similarity::{cosine, l2_norm};
use crate::ScoreMap;

/// The standardized feature matrix with its row norms, the row <-> song id
/// bijection, and the scaler fitted on the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioIndex {
    matrix: FeatureMatrix,
    row_norms: Vec<f64>,
    row_ids: Vec<SongId>,
    id_rows: HashMap<SongId, usize>,
    scaler: StandardScaler,
}

impl AudioIndex {
    /// Fit the scaler on all songs and standardize every row.
    ///
    /// Row `i` belongs to `songs[i]`. If an id repeats, the first row wins
    /// the id -> row mapping.
    ///
    /// # Errors
    /// Fails only if feature widths disagree, which [`AudioFeatures`] rules
    /// out for well-formed input.
    pub fn build(songs: &[Song]) -> Result<Self> {
        let raw: Vec<[f64; FEATURE_COUNT]> = songs.iter().map(|s| s.features.to_vector()).collect();
        let scaler = StandardScaler::fit(&raw, FEATURE_COUNT)?;

        let mut matrix = FeatureMatrix::with_columns(FEATURE_COUNT);
        for row in &raw {
            matrix.push_row(&scaler.transform(row)?)?;
        }
        let row_norms = matrix.row_norms();

        let row_ids: Vec<SongId> = songs.iter().map(|s| s.id.clone()).collect();
        let mut id_rows = HashMap::with_capacity(row_ids.len());
        for (row, id) in row_ids.iter().enumerate() {
            id_rows.entry(id.clone()).or_insert(row);
        }

        log::info!("Built audio feature matrix: {} rows", matrix.n_rows());

        Ok(Self {
            matrix,
            row_norms,
            row_ids,
            id_rows,
            scaler,
        })
    }

    /// Cosine similarity of `query` against the corpus.
    ///
    /// The query is standardized with the corpus scaler. With `rows` set to
    /// `None` every song is scored; otherwise only the listed rows are.
    ///
    /// # Errors
    /// Returns [`crate::Error::RowOutOfRange`] for an unknown row index.
    pub fn score(&self, query: &AudioFeatures, rows: Option<&[usize]>) -> Result<ScoreMap> {
        let query = self.scaler.transform(&query.to_vector())?;
        let query_norm = l2_norm(&query);

        let scores = match rows {
            None => {
                let dots = self.matrix.dot(&query)?;
                dots.into_iter()
                    .enumerate()
                    .map(|(row, dot)| self.scored(row, dot, query_norm))
                    .collect()
            }
            Some(rows) => {
                let dots = self.matrix.dot_rows(rows, &query)?;
                rows.iter()
                    .zip(dots)
                    .map(|(&row, dot)| self.scored(row, dot, query_norm))
                    .collect()
            }
        };
        Ok(scores)
    }

    fn scored(&self, row: usize, dot: f64, query_norm: f64) -> (SongId, f64) {
        (
            self.row_ids[row].clone(),
            cosine(dot, self.row_norms[row], query_norm),
        )
    }

    /// Matrix row for `song`.
    #[must_use]
    pub fn row_of(&self, song: &SongId) -> Option<usize> {
        self.id_rows.get(song).copied()
    }

    /// Rows for the songs in `ids` that have one, in the given order.
    pub fn rows_of<'a, I>(&self, ids: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a SongId>,
    {
        ids.into_iter().filter_map(|id| self.row_of(id)).collect()
    }

    /// Song id of row `row`.
    #[must_use]
    pub fn id_of(&self, row: usize) -> Option<&SongId> {
        self.row_ids.get(row)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    #[must_use]
    pub const fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    #[must_use]
    pub const fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(energy: f64, tempo: f64) -> AudioFeatures {
        AudioFeatures {
            energy,
            tempo,
            ..AudioFeatures::default()
        }
    }

    fn songs() -> Vec<Song> {
        vec![
            Song::new("a", "Artist A", "Song A", features(0.9, 170.0)),
            Song::new("b", "Artist B", "Song B", features(0.2, 70.0)),
            Song::new("c", "Artist C", "Song C", features(0.8, 160.0)),
        ]
    }

    #[test]
    fn test_build_mappings() {
        let audio = AudioIndex::build(&songs()).unwrap();
        assert_eq!(audio.len(), 3);
        assert_eq!(audio.row_of(&SongId::from("b")), Some(1));
        assert_eq!(audio.id_of(2), Some(&SongId::from("c")));
        assert_eq!(audio.row_of(&SongId::from("zzz")), None);
        assert_eq!(audio.matrix().n_rows(), 3);
    }

    #[test]
    fn test_scores_every_song() {
        let audio = AudioIndex::build(&songs()).unwrap();
        let scores = audio.score(&features(0.9, 170.0), None).unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores[&SongId::from("c")] > scores[&SongId::from("b")]);
        assert!((scores[&SongId::from("a")] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scores_within_bounds() {
        let audio = AudioIndex::build(&songs()).unwrap();
        for song in songs() {
            for score in audio.score(&song.features, None).unwrap().values() {
                assert!(score.is_finite());
                assert!((-1.0..=1.0).contains(score));
            }
        }
    }

    #[test]
    fn test_restricted_rows() {
        let audio = AudioIndex::build(&songs()).unwrap();
        let scores = audio.score(&features(0.9, 170.0), Some(&[2])).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores.contains_key(&SongId::from("c")));

        let full = audio.score(&features(0.9, 170.0), None).unwrap();
        assert_eq!(scores[&SongId::from("c")], full[&SongId::from("c")]);
    }

    #[test]
    fn test_restricted_rows_out_of_range() {
        let audio = AudioIndex::build(&songs()).unwrap();
        assert!(audio.score(&features(0.9, 170.0), Some(&[7])).is_err());
    }

    #[test]
    fn test_identical_rows_score_zero() {
        let same = vec![
            Song::new("a", "A", "A", features(0.5, 120.0)),
            Song::new("b", "B", "B", features(0.5, 120.0)),
        ];
        let audio = AudioIndex::build(&same).unwrap();
        let scores = audio.score(&features(0.5, 120.0), None).unwrap();
        assert_eq!(scores[&SongId::from("a")], 0.0);
        assert_eq!(scores[&SongId::from("b")], 0.0);
    }

    #[test]
    fn test_empty_corpus() {
        let audio = AudioIndex::build(&[]).unwrap();
        assert!(audio.is_empty());
        assert!(audio.score(&features(0.5, 120.0), None).unwrap().is_empty());
    }
}
