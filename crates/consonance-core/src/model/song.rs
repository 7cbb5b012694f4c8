use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ids::SongId;

/// Number of audio descriptors per song.
pub const FEATURE_COUNT: usize = 12;

/// The audio descriptors used for similarity, in matrix column order.
///
/// Every feature vector, the corpus matrix, and the fitted scaler use this
/// order; changing it invalidates persisted corpora.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "acousticness",
    "danceability",
    "energy",
    "instrumentalness",
    "key",
    "liveness",
    "loudness",
    "mode",
    "speechiness",
    "tempo",
    "time_signature",
    "valence",
];

/// Raw (unstandardized) audio descriptors for a single song.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub key: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub time_signature: f64,
    pub valence: f64,
}

impl AudioFeatures {
    /// The descriptors as a vector in [`FEATURE_COLUMNS`] order.
    #[must_use]
    pub const fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.acousticness,
            self.danceability,
            self.energy,
            self.instrumentalness,
            self.key,
            self.liveness,
            self.loudness,
            self.mode,
            self.speechiness,
            self.tempo,
            self.time_signature,
            self.valence,
        ]
    }

    /// Build features from values in [`FEATURE_COLUMNS`] order.
    ///
    /// # Errors
    /// Returns [`Error::InvalidData`] if `values` does not hold exactly
    /// [`FEATURE_COUNT`] entries or any entry is not finite.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let v: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
            Error::InvalidData(format!(
                "expected {FEATURE_COUNT} audio features, got {}",
                values.len()
            ))
        })?;
        if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidData(format!(
                "audio feature {} is not finite",
                FEATURE_COLUMNS[pos]
            )));
        }
        Ok(Self {
            acousticness: v[0],
            danceability: v[1],
            energy: v[2],
            instrumentalness: v[3],
            key: v[4],
            liveness: v[5],
            loudness: v[6],
            mode: v[7],
            speechiness: v[8],
            tempo: v[9],
            time_signature: v[10],
            valence: v[11],
        })
    }
}

/// A song in the corpus.
///
/// Immutable once ingested. The serde aliases accept the column names of
/// the common Spotify track datasets (`uri`/`track_id`, `artist_name`,
/// `track_name`) with the descriptors inlined in the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(alias = "uri", alias = "track_id")]
    pub id: SongId,

    #[serde(alias = "artist_name")]
    pub artist: String,

    #[serde(alias = "track_name", alias = "name")]
    pub title: String,

    #[serde(flatten)]
    pub features: AudioFeatures,
}

impl Song {
    #[must_use]
    pub fn new(
        id: impl Into<SongId>,
        artist: impl Into<String>,
        title: impl Into<String>,
        features: AudioFeatures,
    ) -> Self {
        Self {
            id: id.into(),
            artist: artist.into(),
            title: title.into(),
            features,
        }
    }

    /// `artist | title`, the form used for display and free-text queries.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} | {}", self.artist, self.title)
    }
}
