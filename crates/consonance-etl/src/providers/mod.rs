//! External collaborators used to resolve a query.
//!
//! The [`Recommender`](crate::Recommender) only sees the two traits below,
//! so long-lived clients can be shared across queries and swapped for
//! fakes in tests.

pub mod genius;
pub mod resilience;
pub mod spotify;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use consonance_core::text::{fuzzy_match, strip_name};
use consonance_core::{AudioFeatures, SongId};

use crate::error::{ProviderError, ProviderResult};

pub use genius::GeniusClient;
pub use spotify::SpotifyClient;

/// Track metadata returned by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub id: SongId,
    /// Credited artists, primary artist first.
    pub artists: Vec<String>,
    pub title: String,
}

impl TrackInfo {
    /// The first credited artist, or an empty string if none is credited.
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map_or("", String::as_str)
    }

    /// All credited artists joined with spaces.
    pub fn joined_artists(&self) -> String {
        self.artists.join(" ")
    }

    /// Whether this track is a match for a searched artist and title.
    ///
    /// The joined artist credit must fuzzy-match `artist` and the title,
    /// with version decorations stripped, must fuzzy-match `title`.
    pub fn matches(&self, artist: &str, title: &str) -> bool {
        fuzzy_match(&self.joined_artists(), artist)
            && fuzzy_match(&strip_name(&self.title), &strip_name(title))
    }
}

/// Map non-success statuses to the matching [`ProviderError`].
fn check_status(response: Response, source_name: &str, entity: &str) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let source_name = source_name.to_string();
    Err(match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            entity: entity.to_string(),
            source_name,
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { source_name },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth {
            source_name,
            message: status.to_string(),
        },
        _ => ProviderError::Http {
            source_name,
            message: status.to_string(),
        },
    })
}

/// Resolves songs and their audio descriptors.
#[async_trait]
pub trait MetadataProvider: Send + Sync + std::fmt::Debug {
    /// Find the track best matching `artist` and `title`.
    ///
    /// Returns `Ok(None)` when no search hit matches.
    async fn search(&self, artist: &str, title: &str) -> ProviderResult<Option<TrackInfo>>;

    /// Fetch a track by id.
    async fn track(&self, id: &SongId) -> ProviderResult<TrackInfo>;

    /// Fetch the audio descriptors of a track, `Ok(None)` if it has none.
    async fn audio_features(&self, id: &SongId) -> ProviderResult<Option<AudioFeatures>>;
}

/// Fetches lyric text.
#[async_trait]
pub trait LyricsProvider: Send + Sync + std::fmt::Debug {
    /// Lyrics for `artist` and `title` with annotations and blank lines
    /// removed, or `Ok(None)` when the provider has no matching song.
    async fn lyrics(&self, artist: &str, title: &str) -> ProviderResult<Option<String>>;
}

/// Lyrics provider for audio-only queries. It has no songs and needs no
/// credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLyrics;

#[async_trait]
impl LyricsProvider for NoLyrics {
    async fn lyrics(&self, _artist: &str, _title: &str) -> ProviderResult<Option<String>> {
        Ok(None)
    }
}
