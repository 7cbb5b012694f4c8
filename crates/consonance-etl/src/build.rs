//! The offline phase: dataset tables in, corpus bundle out.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use consonance_search::{Corpus, CorpusStats};

use crate::config::IndexSettings;
use crate::dataset;

/// What a build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub tracks_read: usize,
    pub lyric_documents: usize,
    pub stats: CorpusStats,
    pub elapsed: Duration,
}

/// Build a corpus from a track table and a lyrics table and write it to
/// `output`.
///
/// # Errors
/// Fails if either table cannot be loaded, the stopword file is unreadable,
/// or the bundle cannot be written.
pub fn build_corpus(
    tracks: &Path,
    lyrics: &Path,
    settings: &IndexSettings,
    output: &Path,
) -> Result<BuildReport> {
    let started = Instant::now();

    let songs = dataset::load_tracks(tracks)
        .with_context(|| format!("Failed to load tracks from {}", tracks.display()))?;
    let lyrics_table = dataset::load_lyrics(lyrics)
        .with_context(|| format!("Failed to load lyrics from {}", lyrics.display()))?;
    let stopwords = settings.stopwords()?;

    let tracks_read = songs.len();
    let lyric_documents = lyrics_table.len();

    let corpus = Corpus::build(songs, &lyrics_table, &settings.options, stopwords)
        .context("Failed to build corpus")?;
    corpus
        .save(output)
        .with_context(|| format!("Failed to write corpus to {}", output.display()))?;

    let report = BuildReport {
        tracks_read,
        lyric_documents,
        stats: corpus.stats(),
        elapsed: started.elapsed(),
    };
    log::info!(
        "Corpus build finished in {:.2?}: {} songs, {} indexed tokens",
        report.elapsed,
        report.stats.songs,
        report.stats.indexed_tokens
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use consonance_core::SongId;
    use tempfile::TempDir;

    const TRACKS: &str = r#"[
        {"id": "a", "artist": "A", "title": "Alpha",
         "acousticness": 0.1, "danceability": 0.9, "energy": 0.8,
         "instrumentalness": 0.0, "key": 1, "liveness": 0.1, "loudness": -5.0,
         "mode": 1, "speechiness": 0.05, "tempo": 120.0, "time_signature": 4,
         "valence": 0.7},
        {"id": "b", "artist": "B", "title": "Beta",
         "acousticness": 0.8, "danceability": 0.3, "energy": 0.2,
         "instrumentalness": 0.1, "key": 5, "liveness": 0.2, "loudness": -12.0,
         "mode": 0, "speechiness": 0.04, "tempo": 80.0, "time_signature": 3,
         "valence": 0.2},
        {"id": "c", "artist": "C", "title": "Gamma",
         "acousticness": 0.5, "danceability": 0.5, "energy": 0.5,
         "instrumentalness": 0.0, "key": 2, "liveness": 0.1, "loudness": -8.0,
         "mode": 1, "speechiness": 0.05, "tempo": 100.0, "time_signature": 4,
         "valence": 0.5}
    ]"#;

    const LYRICS: &str = r#"{
        "a": {"dance": 4, "night": 2},
        "b": "Rain on the window\nRain in my heart"
    }"#;

    #[test]
    fn test_build_writes_loadable_corpus() {
        let dir = TempDir::new().unwrap();
        let tracks = dir.path().join("tracks.json");
        let lyrics = dir.path().join("lyrics.json");
        let output = dir.path().join("out").join("corpus.json.gz");
        std::fs::write(&tracks, TRACKS).unwrap();
        std::fs::write(&lyrics, LYRICS).unwrap();

        let report = build_corpus(&tracks, &lyrics, &IndexSettings::default(), &output).unwrap();
        assert_eq!(report.tracks_read, 3);
        assert_eq!(report.lyric_documents, 2);
        assert_eq!(report.stats.songs, 2);

        let corpus = Corpus::load(&output).unwrap();
        assert!(corpus.song(&SongId::from("c")).is_none());
        assert!(corpus.lyrics.idf.get("rain").is_some());
        // stopwords are removed by default
        assert!(corpus.lyrics.idf.get("the").is_none());
    }

    #[test]
    fn test_build_fails_on_missing_lyrics_table() {
        let dir = TempDir::new().unwrap();
        let tracks = dir.path().join("tracks.json");
        std::fs::write(&tracks, TRACKS).unwrap();
        let result = build_corpus(
            &tracks,
            &dir.path().join("missing.json"),
            &IndexSettings::default(),
            &dir.path().join("corpus.json.gz"),
        );
        assert!(result.is_err());
    }
}
