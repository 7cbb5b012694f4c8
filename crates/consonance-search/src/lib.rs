//! Hybrid similarity search for consonance.
//!
//! Ranks corpus songs against a resolved query by fusing two independently
//! computed cosine similarities: TF-IDF over lyric tokens (scored sparsely
//! through an inverted index) and standardized audio descriptors (scored
//! densely against the whole feature matrix). Corpus structures are built
//! once by [`Corpus::build`], persisted as a single bundle, and are
//! read-only while serving.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod audio;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod index;
pub mod lyrics;
pub mod matrix;
pub mod scaler;
mod similarity;

pub use audio::AudioIndex;
pub use corpus::{Corpus, CorpusStats};
pub use engine::{Recommendation, SimilarityEngine};
pub use error::{Error, Result};
pub use fusion::{CandidateSet, Exclusion, ScoredSong};
pub use index::{IdfTable, IndexBuilder, IndexOptions, InvertedIndex, Posting, SongNorms};
pub use lyrics::LyricIndex;
pub use matrix::FeatureMatrix;
pub use scaler::StandardScaler;

/// Cosine similarity per song id.
pub type ScoreMap = std::collections::HashMap<consonance_core::SongId, f64>;
