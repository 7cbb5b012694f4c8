//! Genius lyrics provider.
//!
//! Songs are found through the authenticated search API; the lyrics
//! themselves are not part of the API and are read from the song page's
//! lyrics containers. Annotation text comes from the referents endpoint
//! and can be appended to the lyrics.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use consonance_core::text::{clean_lyrics, fuzzy_match, strip_name};

use super::resilience::{with_retry, RateLimiter, RetryPolicy};
use super::{check_status, LyricsProvider};
use crate::config::Config;
use crate::error::{ProviderError, ProviderResult};

const SOURCE: &str = "Genius";
const API_BASE: &str = "https://api.genius.com";

static LYRICS_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div[^>]*data-lyrics-container="true"[^>]*>(.*?)</div>"#)
        .expect("valid lyrics container regex")
});

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "type")]
    hit_type: String,
    result: GeniusSong,
}

#[derive(Debug, Deserialize)]
struct GeniusSong {
    id: u64,
    title: String,
    url: String,
    primary_artist: GeniusArtist,
}

#[derive(Debug, Deserialize)]
struct GeniusArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReferentsResponse {
    response: Referents,
}

#[derive(Debug, Deserialize)]
struct Referents {
    #[serde(default)]
    referents: Vec<Referent>,
}

#[derive(Debug, Deserialize)]
struct Referent {
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    body: AnnotationBody,
}

#[derive(Debug, Deserialize)]
struct AnnotationBody {
    #[serde(default)]
    plain: Option<String>,
}

/// Genius API client.
#[derive(Debug)]
pub struct GeniusClient {
    http: Client,
    token: String,
    api_base: String,
    include_annotations: bool,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl GeniusClient {
    /// Create a client with a Genius API access token.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http = Client::builder()
            .user_agent("consonance/0.1.0 (https://github.com/oxur/consonance)")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            api_base: API_BASE.to_string(),
            include_annotations: false,
            rate_limiter: RateLimiter::new(5),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from the configured token.
    ///
    /// # Errors
    /// Returns [`ProviderError::Auth`] when no token is configured.
    pub fn from_config(config: &Config) -> ProviderResult<Self> {
        let token = config
            .genius_token
            .as_deref()
            .ok_or_else(|| ProviderError::Auth {
                source_name: SOURCE.to_string(),
                message: "genius_token must be configured".to_string(),
            })?;
        Ok(Self::new(token, config.request_timeout())?
            .with_annotations(config.include_annotations))
    }

    #[must_use]
    pub fn with_base_url(mut self, api: impl Into<String>) -> Self {
        self.api_base = api.into();
        self
    }

    /// Append the song's annotation text to its lyrics.
    #[must_use]
    pub fn with_annotations(mut self, include: bool) -> Self {
        self.include_annotations = include;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Find the song page for `artist` and `title`.
    ///
    /// A hit is accepted only when its primary artist fuzzy-matches
    /// `artist` and its stripped title fuzzy-matches the stripped `title`.
    async fn find_song(&self, artist: &str, title: &str) -> ProviderResult<Option<GeniusSong>> {
        let wanted_title = strip_name(title);
        let q = format!("{} {}", artist, wanted_title);
        let q = q.as_str();
        let hits: SearchResponse = with_retry(SOURCE, self.retry, || async move {
            self.rate_limiter.acquire().await;
            let response = self
                .http
                .get(format!("{}/search", self.api_base))
                .query(&[("q", q)])
                .bearer_auth(&self.token)
                .send()
                .await?;
            check_status(response, SOURCE, "search")?
                .json::<SearchResponse>()
                .await
                .map_err(|e| ProviderError::Parse {
                    source_name: SOURCE.to_string(),
                    message: e.to_string(),
                })
        })
        .await?;

        let found = hits
            .response
            .hits
            .into_iter()
            .filter(|hit| hit.hit_type == "song")
            .map(|hit| hit.result)
            .find(|song| {
                fuzzy_match(&song.primary_artist.name, artist)
                    && fuzzy_match(&strip_name(&song.title), &wanted_title)
            });
        if found.is_none() {
            log::debug!("No Genius song matching query '{}'", q);
        }
        Ok(found)
    }

    /// Plain text of every annotation on the song, space-separated.
    ///
    /// A song Genius has no referents for yields an empty string.
    async fn annotations(&self, song_id: u64) -> ProviderResult<String> {
        let song_id = song_id.to_string();
        let song_id = song_id.as_str();
        let result = with_retry(SOURCE, self.retry, || async move {
            self.rate_limiter.acquire().await;
            let response = self
                .http
                .get(format!("{}/referents", self.api_base))
                .query(&[
                    ("song_id", song_id),
                    ("text_format", "plain"),
                    ("per_page", "50"),
                ])
                .bearer_auth(&self.token)
                .send()
                .await?;
            check_status(response, SOURCE, "referents")?
                .json::<ReferentsResponse>()
                .await
                .map_err(|e| ProviderError::Parse {
                    source_name: SOURCE.to_string(),
                    message: e.to_string(),
                })
        })
        .await;

        let referents = match result {
            Ok(body) => body.response.referents,
            Err(e) if e.is_not_found() => return Ok(String::new()),
            Err(e) => return Err(e),
        };
        Ok(referents
            .into_iter()
            .flat_map(|r| r.annotations)
            .filter_map(|a| a.body.plain)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    async fn fetch_page(&self, url: &str) -> ProviderResult<String> {
        with_retry(SOURCE, self.retry, || async move {
            self.rate_limiter.acquire().await;
            let response = self.http.get(url).send().await?;
            Ok(check_status(response, SOURCE, "lyrics page")?.text().await?)
        })
        .await
    }
}

#[async_trait]
impl LyricsProvider for GeniusClient {
    async fn lyrics(&self, artist: &str, title: &str) -> ProviderResult<Option<String>> {
        let Some(song) = self.find_song(artist, title).await? else {
            return Ok(None);
        };
        let page = self.fetch_page(&song.url).await?;
        let Some(mut lyrics) = extract_lyrics(&page) else {
            log::warn!(
                "Genius page for '{} | {}' has no lyrics container",
                song.primary_artist.name,
                song.title
            );
            return Ok(None);
        };
        if self.include_annotations {
            let notes = clean_lyrics(&self.annotations(song.id).await?);
            if !notes.is_empty() {
                log::debug!("Appending annotations for Genius song {}", song.id);
                lyrics.push('\n');
                lyrics.push_str(&notes);
            }
        }
        Ok(Some(lyrics))
    }
}

/// Pull the lyric text out of a song page.
///
/// Returns `None` when the page has no lyrics container or the containers
/// hold nothing but annotations.
fn extract_lyrics(page: &str) -> Option<String> {
    let raw: Vec<String> = LYRICS_CONTAINER
        .captures_iter(page)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let text = LINE_BREAK.replace_all(m.as_str(), "\n");
            decode_entities(&TAG.replace_all(&text, ""))
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();
    if raw.is_empty() {
        return None;
    }
    let cleaned = clean_lyrics(&raw.join("\n"));
    (!cleaned.is_empty()).then_some(cleaned)
}

fn decode_entities(text: &str) -> String {
    text.replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
