//! The persisted corpus bundle.
//!
//! A [`Corpus`] holds every structure the online scorer reads: the lyric
//! index (postings, vocabulary, IDF, song norms), the audio index (matrix,
//! row norms, row <-> id maps, fitted scaler), and the song records. It is
//! built offline in one batch and written as gzip-compressed JSON; a
//! serving process loads it whole and never mutates it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use consonance_core::text::Stopwords;
use consonance_core::{Song, SongId, TokenCounts};

use crate::audio::AudioIndex;
use crate::error::Result;
use crate::index::IndexOptions;
use crate::lyrics::LyricIndex;

/// Read-only corpus structures shared by every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub built_at: DateTime<Utc>,
    pub options: IndexOptions,
    pub songs: BTreeMap<SongId, Song>,
    pub lyrics: LyricIndex,
    pub audio: AudioIndex,
}

/// Summary counts for a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub built_at: DateTime<Utc>,
    pub songs: usize,
    pub lyric_documents: usize,
    pub indexed_tokens: usize,
    pub idf_tokens: usize,
    pub matrix_rows: usize,
}

impl Corpus {
    /// Build every corpus structure from song records and lyric counts.
    ///
    /// Only songs that have lyrics enter the audio matrix, so both signals
    /// cover the same songs. IDF is computed over all lyric documents.
    ///
    /// # Errors
    /// Propagates matrix construction failures.
    pub fn build(
        songs: Vec<Song>,
        lyrics: &BTreeMap<SongId, TokenCounts>,
        options: &IndexOptions,
        stopwords: Stopwords,
    ) -> Result<Self> {
        let total = songs.len();
        let mut kept: Vec<Song> = Vec::with_capacity(total);
        let mut seen = BTreeSet::new();
        for song in songs {
            if !lyrics.contains_key(&song.id) {
                continue;
            }
            if !seen.insert(song.id.clone()) {
                log::warn!("Duplicate song id {}, keeping the first record", song.id);
                continue;
            }
            kept.push(song);
        }
        log::info!(
            "Building corpus from {} of {} songs with lyrics",
            kept.len(),
            total
        );

        let lyric_index = LyricIndex::build(lyrics, options, stopwords);
        let audio = AudioIndex::build(&kept)?;
        let songs = kept.into_iter().map(|s| (s.id.clone(), s)).collect();

        Ok(Self {
            built_at: Utc::now(),
            options: options.clone(),
            songs,
            lyrics: lyric_index,
            audio,
        })
    }

    /// Look up a song record.
    #[must_use]
    pub fn song(&self, id: &SongId) -> Option<&Song> {
        self.songs.get(id)
    }

    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            built_at: self.built_at,
            songs: self.songs.len(),
            lyric_documents: self.lyrics.n_docs,
            indexed_tokens: self.lyrics.index.len(),
            idf_tokens: self.lyrics.idf.len(),
            matrix_rows: self.audio.len(),
        }
    }

    /// Write the bundle to `path`, replacing any existing file.
    ///
    /// The bundle is written to a sibling temporary file first and renamed
    /// into place, so a crash never leaves a truncated corpus behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut encoder, self)?;
            encoder.finish()?.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        log::info!("Saved corpus to {}", path.display());
        Ok(())
    }

    /// Load a bundle written by [`Corpus::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let corpus: Self = serde_json::from_reader(BufReader::new(decoder))?;
        log::info!(
            "Loaded corpus from {}: {} songs, {} indexed tokens",
            path.display(),
            corpus.songs.len(),
            corpus.lyrics.index.len()
        );
        Ok(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consonance_core::AudioFeatures;

    fn sample() -> (Vec<Song>, BTreeMap<SongId, TokenCounts>) {
        let songs = vec![
            Song::new(
                "a",
                "Artist A",
                "Song A",
                AudioFeatures {
                    energy: 0.9,
                    ..AudioFeatures::default()
                },
            ),
            Song::new(
                "b",
                "Artist B",
                "Song B",
                AudioFeatures {
                    energy: 0.1,
                    ..AudioFeatures::default()
                },
            ),
            Song::new("no-lyrics", "Artist C", "Song C", AudioFeatures::default()),
        ];
        let mut lyrics = BTreeMap::new();
        lyrics.insert(
            SongId::from("a"),
            [("love", 3), ("you", 2)].into_iter().collect(),
        );
        lyrics.insert(SongId::from("b"), [("love", 1)].into_iter().collect());
        (songs, lyrics)
    }

    fn build() -> Corpus {
        let (songs, lyrics) = sample();
        Corpus::build(songs, &lyrics, &IndexOptions::default(), Stopwords::none()).unwrap()
    }

    #[test]
    fn test_build_keeps_only_songs_with_lyrics() {
        let corpus = build();
        assert_eq!(corpus.songs.len(), 2);
        assert!(corpus.song(&SongId::from("no-lyrics")).is_none());
        assert_eq!(corpus.audio.len(), 2);
    }

    #[test]
    fn test_build_skips_duplicate_ids() {
        let (mut songs, lyrics) = sample();
        songs.push(Song::new("a", "Other", "Other", AudioFeatures::default()));
        let corpus =
            Corpus::build(songs, &lyrics, &IndexOptions::default(), Stopwords::none()).unwrap();
        assert_eq!(corpus.songs.len(), 2);
        assert_eq!(corpus.song(&SongId::from("a")).unwrap().artist, "Artist A");
    }

    #[test]
    fn test_stats() {
        let stats = build().stats();
        assert_eq!(stats.songs, 2);
        assert_eq!(stats.lyric_documents, 2);
        assert_eq!(stats.indexed_tokens, 2);
        assert_eq!(stats.idf_tokens, 2);
        assert_eq!(stats.matrix_rows, 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("corpus.json.gz");
        let corpus = build();

        corpus.save(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let loaded = Corpus::load(&path).unwrap();
        assert_eq!(loaded.stats(), corpus.stats());
        assert_eq!(loaded.songs, corpus.songs);
        assert_eq!(loaded.lyrics.index, corpus.lyrics.index);
        for (token, idf) in corpus.lyrics.idf.iter() {
            assert!((loaded.lyrics.idf.get(token).unwrap() - idf).abs() < 1e-12);
        }
        assert_eq!(loaded.audio.row_of(&SongId::from("b")), Some(1));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Corpus::load("/nonexistent/corpus.json.gz").is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corpus.json.gz");
        std::fs::write(&path, b"not a corpus").unwrap();
        assert!(Corpus::load(&path).is_err());
    }
}
