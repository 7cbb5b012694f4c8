//! Spotify Web API metadata provider.
//!
//! Authenticates with the client-credentials flow, resolves songs through
//! the track search endpoint and reads audio descriptors from the
//! audio-features endpoint. Song ids are Spotify URIs
//! (`spotify:track:<id>`); the bare id is used in request paths.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use consonance_core::text::strip_name;
use consonance_core::{AudioFeatures, SongId};

use super::resilience::{with_retry, RateLimiter, RetryPolicy};
use super::{check_status, MetadataProvider, TrackInfo};
use crate::config::Config;
use crate::error::{ProviderError, ProviderResult};

const SOURCE: &str = "Spotify";
const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
const API_BASE: &str = "https://api.spotify.com";
const SEARCH_LIMIT: &str = "10";

/// Refresh the access token this long before Spotify says it expires.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

impl From<SpotifyTrack> for TrackInfo {
    fn from(track: SpotifyTrack) -> Self {
        Self {
            id: SongId::new(track.uri),
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            title: track.name,
        }
    }
}

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API client.
///
/// Holds one HTTP connection pool and a cached access token; share it
/// across queries rather than creating one per request.
#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    accounts_base: String,
    api_base: String,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl SpotifyClient {
    /// Create a client for the given application credentials.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http = Client::builder()
            .user_agent("consonance/0.1.0 (https://github.com/oxur/consonance)")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            accounts_base: ACCOUNTS_BASE.to_string(),
            api_base: API_BASE.to_string(),
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(10),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from the configured credentials.
    ///
    /// # Errors
    /// Returns [`ProviderError::Auth`] when either credential is missing.
    pub fn from_config(config: &Config) -> ProviderResult<Self> {
        match (&config.spotify_client_id, &config.spotify_client_secret) {
            (Some(id), Some(secret)) => Self::new(id, secret, config.request_timeout()),
            _ => Err(ProviderError::Auth {
                source_name: SOURCE.to_string(),
                message: "spotify_client_id and spotify_client_secret must be configured"
                    .to_string(),
            }),
        }
    }

    /// Point the client at different hosts (mock servers in tests).
    #[must_use]
    pub fn with_base_urls(mut self, accounts: impl Into<String>, api: impl Into<String>) -> Self {
        self.accounts_base = accounts.into();
        self.api_base = api.into();
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn access_token(&self) -> ProviderResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let credentials = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_base))
            .header(AUTHORIZATION, format!("Basic {credentials}"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;
        let response = check_status(response, SOURCE, "access token")?;
        let token: TokenResponse = response.json().await.map_err(|e| ProviderError::Parse {
            source_name: SOURCE.to_string(),
            message: e.to_string(),
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_MARGIN);
        log::debug!("Obtained Spotify access token valid for {:?}", lifetime);
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        entity: &str,
    ) -> ProviderResult<T> {
        with_retry(SOURCE, self.retry, || async move {
            self.rate_limiter.acquire().await;
            let token = self.access_token().await?;
            let response = self
                .http
                .get(format!("{}{}", self.api_base, path))
                .query(query)
                .bearer_auth(token)
                .send()
                .await?;
            let response = match check_status(response, SOURCE, entity) {
                Err(e @ ProviderError::Auth { .. }) => {
                    log::debug!("Spotify rejected the access token, dropping it");
                    *self.token.lock().await = None;
                    return Err(e);
                }
                other => other?,
            };
            response.json::<T>().await.map_err(|e| ProviderError::Parse {
                source_name: SOURCE.to_string(),
                message: e.to_string(),
            })
        })
        .await
    }
}

#[async_trait]
impl MetadataProvider for SpotifyClient {
    async fn search(&self, artist: &str, title: &str) -> ProviderResult<Option<TrackInfo>> {
        let title = strip_name(title);
        let q = format!("{artist} {title}");
        let page: SearchResponse = self
            .get_json(
                "/v1/search",
                &[("q", q.as_str()), ("type", "track"), ("limit", SEARCH_LIMIT)],
                "search",
            )
            .await?;

        let total = page.tracks.items.len();
        let found = page
            .tracks
            .items
            .into_iter()
            .map(TrackInfo::from)
            .find(|track| track.matches(artist, &title));
        log::debug!(
            "Spotify search '{}' returned {} hits, match: {:?}",
            q,
            total,
            found.as_ref().map(|t| t.id.as_str())
        );
        Ok(found)
    }

    async fn track(&self, id: &SongId) -> ProviderResult<TrackInfo> {
        let path = format!("/v1/tracks/{}", id.bare());
        let track: SpotifyTrack = self.get_json(&path, &[], "track").await?;
        Ok(track.into())
    }

    async fn audio_features(&self, id: &SongId) -> ProviderResult<Option<AudioFeatures>> {
        let path = format!("/v1/audio-features/{}", id.bare());
        match self
            .get_json::<Option<AudioFeatures>>(&path, &[], "audio features")
            .await
        {
            Ok(features) => Ok(features),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_credentials() {
        let mut config = Config::default();
        assert!(matches!(
            SpotifyClient::from_config(&config),
            Err(ProviderError::Auth { .. })
        ));
        config.spotify_client_id = Some("id".to_string());
        config.spotify_client_secret = Some("secret".to_string());
        assert!(SpotifyClient::from_config(&config).is_ok());
    }

    #[test]
    fn test_track_conversion() {
        let track: SpotifyTrack = serde_json::from_str(
            r#"{"uri": "spotify:track:abc", "name": "Shallow",
                "artists": [{"name": "Lady Gaga"}, {"name": "Bradley Cooper"}],
                "popularity": 80}"#,
        )
        .unwrap();
        let info = TrackInfo::from(track);
        assert_eq!(info.id.bare(), "abc");
        assert_eq!(info.primary_artist(), "Lady Gaga");
    }
}
