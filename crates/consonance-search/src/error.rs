//! Error types for similarity search.

use thiserror::Error;

/// Errors raised while building, loading, or querying a corpus.
#[derive(Debug, Error)]
pub enum Error {
    /// The lyrics weight is NaN or outside `[0, 1]`.
    #[error("lyrics weight must be within [0, 1], got {0}")]
    InvalidWeight(f64),

    /// A vector's length does not match the feature matrix width.
    #[error("dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Lyrics were weighted above zero but the query carries none.
    #[error("query has no lyrics but lyrics weight is above zero")]
    LyricsRequired,

    /// A restricted audio scoring pass named a row the matrix lacks.
    #[error("feature matrix has no row {0}")]
    RowOutOfRange(usize),

    /// Reading or writing a persisted corpus failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted corpus could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for search results.
pub type Result<T> = std::result::Result<T, Error>;
