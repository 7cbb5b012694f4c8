//! Error types for provider calls and query resolution.

use thiserror::Error;

/// Errors raised by the external metadata and lyrics providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with an unexpected HTTP status.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The provider returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested entity does not exist at the provider.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response body could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Credentials are missing or were rejected.
    #[error("authentication failed for {source_name}: {message}")]
    Auth {
        source_name: String,
        message: String,
    },

    /// Transport-level failure from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl ProviderError {
    /// Returns `true` when the call may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Typed outcome of resolving and ranking one query.
///
/// Every resolution stage has its own miss, so callers can report which
/// step failed instead of a generic error.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The query text could not be parsed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No song matched the query artist and title.
    #[error("song not found: {0}")]
    SongNotFound(String),

    /// The song exists but has no audio features.
    #[error("no audio features for {0}")]
    MissingFeatures(String),

    /// Lyrics are weighted but none were found for the song.
    #[error("lyrics not found for {0}")]
    LyricsNotFound(String),

    /// A provider call did not finish within the configured timeout.
    #[error("timed out during {stage}")]
    Timeout { stage: &'static str },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Search(#[from] consonance_search::Error),
}

impl RecommendError {
    /// Returns `true` for the resolution misses (song, features, lyrics).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SongNotFound(_) | Self::MissingFeatures(_) | Self::LyricsNotFound(_)
        )
    }
}
