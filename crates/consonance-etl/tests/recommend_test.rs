//! Query resolution tests against in-memory providers.
//!
//! The corpus mirrors the engine's own fixtures: audio similarity to the
//! query song falls from `near` to `far`, and only `far` shares its lyrics.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use consonance_core::text::Stopwords;
use consonance_core::{AudioFeatures, Song, SongId, TokenCounts};
use consonance_etl::{
    LyricsProvider, MetadataProvider, ProviderError, ProviderResult, QueryInput, RecommendError,
    Recommender, TrackInfo,
};
use consonance_search::{Corpus, IndexOptions, SimilarityEngine};

const QUERY_ID: &str = "spotify:track:q";

fn features(energy: f64, danceability: f64) -> AudioFeatures {
    AudioFeatures {
        energy,
        danceability,
        ..AudioFeatures::default()
    }
}

fn engine() -> SimilarityEngine {
    let songs = vec![
        Song::new(QUERY_ID, "Query Artist", "Query Song", features(0.9, 0.8)),
        Song::new("spotify:track:near", "Near", "Near Song", features(0.85, 0.75)),
        Song::new("spotify:track:mid", "Mid", "Mid Song", features(0.5, 0.6)),
        Song::new("spotify:track:far", "Far", "Far Song", features(0.1, 0.1)),
    ];
    let mut lyrics: BTreeMap<SongId, TokenCounts> = BTreeMap::new();
    lyrics.insert(QUERY_ID.into(), [("love", 3), ("night", 2)].into_iter().collect());
    lyrics.insert("spotify:track:near".into(), [("sun", 2)].into_iter().collect());
    lyrics.insert("spotify:track:mid".into(), [("rain", 1)].into_iter().collect());
    lyrics.insert("spotify:track:far".into(), [("love", 3), ("night", 2)].into_iter().collect());

    let corpus = Corpus::build(songs, &lyrics, &IndexOptions::default(), Stopwords::none()).unwrap();
    SimilarityEngine::new(Arc::new(corpus))
}

#[derive(Debug, Default)]
struct FakeMetadata {
    tracks: Vec<(TrackInfo, Option<AudioFeatures>)>,
    delay: Option<Duration>,
}

impl FakeMetadata {
    fn with_query_song(features: Option<AudioFeatures>) -> Self {
        Self {
            tracks: vec![(
                TrackInfo {
                    id: SongId::from(QUERY_ID),
                    artists: vec!["Query Artist".to_string()],
                    title: "Query Song - Remastered".to_string(),
                },
                features,
            )],
            delay: None,
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn not_found() -> ProviderError {
        ProviderError::NotFound {
            entity: "track".to_string(),
            source_name: "fake".to_string(),
        }
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadata {
    async fn search(&self, artist: &str, title: &str) -> ProviderResult<Option<TrackInfo>> {
        self.pause().await;
        Ok(self
            .tracks
            .iter()
            .map(|(track, _)| track)
            .find(|track| track.matches(artist, title))
            .cloned())
    }

    async fn track(&self, id: &SongId) -> ProviderResult<TrackInfo> {
        self.pause().await;
        self.tracks
            .iter()
            .find(|(track, _)| &track.id == id)
            .map(|(track, _)| track.clone())
            .ok_or_else(Self::not_found)
    }

    async fn audio_features(&self, id: &SongId) -> ProviderResult<Option<AudioFeatures>> {
        self.pause().await;
        Ok(self
            .tracks
            .iter()
            .find(|(track, _)| &track.id == id)
            .and_then(|(_, features)| *features))
    }
}

#[derive(Debug, Default)]
struct FakeLyrics {
    by_title: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeLyrics {
    fn with_query_lyrics() -> Self {
        let mut by_title = HashMap::new();
        by_title.insert(
            "query song".to_string(),
            "Love, love, love\nnight (night)\nnight".to_string(),
        );
        Self {
            by_title,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LyricsProvider for FakeLyrics {
    async fn lyrics(&self, _artist: &str, title: &str) -> ProviderResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.by_title.get(&title.to_lowercase()).cloned())
    }
}

fn recommender(metadata: FakeMetadata, lyrics: Arc<FakeLyrics>) -> Recommender {
    Recommender::new(engine(), Arc::new(metadata), lyrics, Duration::from_secs(5))
}

fn ids(recs: &consonance_etl::Recommendations) -> Vec<&str> {
    recs.results.iter().map(|r| r.song.id.as_str()).collect()
}

fn query_text() -> QueryInput {
    QueryInput::parse("Query Artist | Query Song").unwrap()
}

#[tokio::test]
async fn test_audio_only_query_skips_lyrics() {
    let lyrics = Arc::new(FakeLyrics::with_query_lyrics());
    let rec = recommender(
        FakeMetadata::with_query_song(Some(features(0.9, 0.8))),
        Arc::clone(&lyrics),
    );

    let recs = rec.recommend(&query_text(), 0.0, 5).await.unwrap();
    assert_eq!(recs.query.id, SongId::from(QUERY_ID));
    assert_eq!(
        ids(&recs),
        vec!["spotify:track:near", "spotify:track:mid", "spotify:track:far"]
    );
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lyrics_weighted_query_fetches_and_uses_lyrics() {
    let lyrics = Arc::new(FakeLyrics::with_query_lyrics());
    let rec = recommender(
        FakeMetadata::with_query_song(Some(features(0.9, 0.8))),
        Arc::clone(&lyrics),
    );

    let recs = rec.recommend(&query_text(), 1.0, 2).await.unwrap();
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 1);
    assert_eq!(recs.results.len(), 2);
    assert_eq!(recs.results[0].song.id, SongId::from("spotify:track:far"));
    assert!((recs.results[0].score - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_id_query() {
    let rec = recommender(
        FakeMetadata::with_query_song(Some(features(0.9, 0.8))),
        Arc::new(FakeLyrics::with_query_lyrics()),
    );
    let recs = rec
        .recommend(&QueryInput::Id(SongId::from(QUERY_ID)), 0.0, 1)
        .await
        .unwrap();
    assert_eq!(recs.query.artist, "Query Artist");
    assert_eq!(ids(&recs), vec!["spotify:track:near"]);
}

#[tokio::test]
async fn test_unknown_song() {
    let rec = recommender(
        FakeMetadata::with_query_song(Some(features(0.9, 0.8))),
        Arc::new(FakeLyrics::default()),
    );

    let by_text = rec
        .recommend(&QueryInput::parse("Nobody | Nothing").unwrap(), 0.0, 5)
        .await;
    assert!(matches!(by_text, Err(RecommendError::SongNotFound(_))));

    let by_id = rec
        .recommend(&QueryInput::Id(SongId::from("spotify:track:zzz")), 0.0, 5)
        .await;
    assert!(matches!(by_id, Err(RecommendError::SongNotFound(_))));
}

#[tokio::test]
async fn test_missing_features() {
    let rec = recommender(
        FakeMetadata::with_query_song(None),
        Arc::new(FakeLyrics::with_query_lyrics()),
    );
    let result = rec.recommend(&query_text(), 0.0, 5).await;
    assert!(matches!(result, Err(RecommendError::MissingFeatures(_))));
}

#[tokio::test]
async fn test_missing_lyrics_only_fails_when_weighted() {
    let rec = recommender(
        FakeMetadata::with_query_song(Some(features(0.9, 0.8))),
        Arc::new(FakeLyrics::default()),
    );

    let weighted = rec.recommend(&query_text(), 0.5, 5).await;
    let err = weighted.unwrap_err();
    assert!(matches!(err, RecommendError::LyricsNotFound(_)));
    assert!(err.is_not_found());

    assert!(rec.recommend(&query_text(), 0.0, 5).await.is_ok());
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let metadata = FakeMetadata {
        delay: Some(Duration::from_secs(2)),
        ..FakeMetadata::with_query_song(Some(features(0.9, 0.8)))
    };
    let rec = Recommender::new(
        engine(),
        Arc::new(metadata),
        Arc::new(FakeLyrics::default()),
        Duration::from_millis(20),
    );
    let result = rec.recommend(&query_text(), 0.0, 5).await;
    assert!(matches!(
        result,
        Err(RecommendError::Timeout { stage: "search" })
    ));
}

#[tokio::test]
async fn test_invalid_weight_is_rejected_before_any_call() {
    let lyrics = Arc::new(FakeLyrics::with_query_lyrics());
    let rec = recommender(
        FakeMetadata::with_query_song(Some(features(0.9, 0.8))),
        Arc::clone(&lyrics),
    );
    let result = rec.recommend(&query_text(), 2.0, 5).await;
    assert!(matches!(result, Err(RecommendError::Search(_))));
    assert_eq!(lyrics.calls.load(Ordering::SeqCst), 0);
}
