//! The online phase: resolve a query through the providers, then rank.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use consonance_core::text::{lyric_token_counts, parse_artist_title, strip_name};
use consonance_core::{AudioFeatures, Query, Song, SongId, TokenCounts};
use consonance_search::fusion::validate_weight;
use consonance_search::{Recommendation, SimilarityEngine};

use crate::error::{ProviderResult, RecommendError};
use crate::providers::{LyricsProvider, MetadataProvider, TrackInfo};

type Result<T> = std::result::Result<T, RecommendError>;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// Free text, resolved through the metadata provider's search.
    Text { artist: String, title: String },
    /// A provider id such as `spotify:track:...`.
    Id(SongId),
}

impl QueryInput {
    /// Parse `"artist | title"`.
    ///
    /// # Errors
    /// Returns [`RecommendError::InvalidQuery`] when either side is blank or
    /// the separator is missing.
    pub fn parse(text: &str) -> Result<Self> {
        let (artist, title) =
            parse_artist_title(text).map_err(|e| RecommendError::InvalidQuery(e.to_string()))?;
        Ok(Self::Text { artist, title })
    }
}

impl fmt::Display for QueryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { artist, title } => write!(f, "{artist} | {title}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// A resolved query and its ranked results.
#[derive(Debug, Clone)]
pub struct Recommendations {
    /// The song the query resolved to.
    pub query: Song,
    pub results: Vec<Recommendation>,
    /// Wall time for resolution and ranking.
    pub elapsed: Duration,
}

/// Resolves queries through long-lived provider handles and ranks them
/// against a loaded corpus.
#[derive(Debug, Clone)]
pub struct Recommender {
    engine: SimilarityEngine,
    metadata: Arc<dyn MetadataProvider>,
    lyrics: Arc<dyn LyricsProvider>,
    timeout: Duration,
}

impl Recommender {
    pub fn new(
        engine: SimilarityEngine,
        metadata: Arc<dyn MetadataProvider>,
        lyrics: Arc<dyn LyricsProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            metadata,
            lyrics,
            timeout,
        }
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    /// Resolve `input` and rank the corpus against it.
    ///
    /// Lyrics are only fetched when `lyrics_weight > 0`. Once the track is
    /// known, the audio-feature and lyrics fetches run concurrently.
    ///
    /// # Errors
    /// Each resolution stage fails with its own variant:
    /// [`RecommendError::SongNotFound`], [`RecommendError::MissingFeatures`]
    /// or [`RecommendError::LyricsNotFound`]. A provider call that outlives
    /// the timeout yields [`RecommendError::Timeout`].
    pub async fn recommend(
        &self,
        input: &QueryInput,
        lyrics_weight: f64,
        n_results: usize,
    ) -> Result<Recommendations> {
        let started = Instant::now();
        let weight = validate_weight(lyrics_weight)?;
        let wants_lyrics = weight > 0.0;

        let (track, features, lyrics) = match input {
            QueryInput::Text { artist, title } => {
                let track = self
                    .timed("search", self.metadata.search(artist, title))
                    .await?
                    .ok_or_else(|| RecommendError::SongNotFound(input.to_string()))?;
                let (features, lyrics) = tokio::join!(
                    self.timed("audio features", self.metadata.audio_features(&track.id)),
                    self.fetch_lyrics(&track, wants_lyrics),
                );
                (track, features?, lyrics?)
            }
            QueryInput::Id(id) => {
                let (track, features) = tokio::join!(
                    self.timed("track", self.metadata.track(id)),
                    self.timed("audio features", self.metadata.audio_features(id)),
                );
                let track = match track {
                    Err(RecommendError::Provider(e)) if e.is_not_found() => {
                        return Err(RecommendError::SongNotFound(id.to_string()));
                    }
                    other => other?,
                };
                let lyrics = self.fetch_lyrics(&track, wants_lyrics).await?;
                (track, features?, lyrics)
            }
        };

        let label = format!("{} | {}", track.primary_artist(), track.title);
        let features: AudioFeatures =
            features.ok_or_else(|| RecommendError::MissingFeatures(label.clone()))?;
        let lyrics = match lyrics {
            Some(lyrics) => Some(lyrics),
            None if wants_lyrics => return Err(RecommendError::LyricsNotFound(label)),
            None => None,
        };

        let song = Song::new(
            track.id.clone(),
            track.primary_artist(),
            track.title.clone(),
            features,
        );
        let mut query = Query::new(
            song.id.clone(),
            track.primary_artist().to_lowercase(),
            strip_name(&track.title).to_lowercase(),
            features,
        );
        if let Some(lyrics) = lyrics {
            query = query.with_lyrics(lyrics);
        }

        let results = self.engine.recommend(&query, weight, n_results)?;
        let elapsed = started.elapsed();
        log::info!(
            "Ranked {} results for {} in {:.2?}",
            results.len(),
            song.label(),
            elapsed
        );

        Ok(Recommendations {
            query: song,
            results,
            elapsed,
        })
    }

    /// Lyric token counts for `track`, or `None` without a call when
    /// lyrics are not wanted.
    async fn fetch_lyrics(&self, track: &TrackInfo, wanted: bool) -> Result<Option<TokenCounts>> {
        if !wanted {
            return Ok(None);
        }
        let title = strip_name(&track.title);
        let text = self
            .timed("lyrics", self.lyrics.lyrics(track.primary_artist(), &title))
            .await?;
        Ok(text.map(|text| lyric_token_counts(&text)))
    }

    async fn timed<T>(
        &self,
        stage: &'static str,
        call: impl Future<Output = ProviderResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                log::warn!("Provider call for {} timed out after {:?}", stage, self.timeout);
                Err(RecommendError::Timeout { stage })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_text() {
        let input = QueryInput::parse("Lady Gaga | Shallow").unwrap();
        assert_eq!(
            input,
            QueryInput::Text {
                artist: "lady gaga".to_string(),
                title: "shallow".to_string(),
            }
        );
        assert_eq!(input.to_string(), "lady gaga | shallow");
    }

    #[test]
    fn test_parse_query_rejects_malformed_text() {
        assert!(matches!(
            QueryInput::parse("no separator"),
            Err(RecommendError::InvalidQuery(_))
        ));
        assert!(matches!(
            QueryInput::parse(" | Shallow"),
            Err(RecommendError::InvalidQuery(_))
        ));
    }
}
