//! Dataset loading for the offline build.
//!
//! Two JSON inputs feed the corpus:
//!
//! - a track table: an array of records with an id (`id`, `uri` or
//!   `track_id`), artist name, track name and the twelve audio descriptor
//!   columns;
//! - a lyrics table: an object mapping song id to either pre-computed token
//!   counts or raw lyric text, which is cleaned and tokenized on load.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use consonance_core::text::lyric_token_counts;
use consonance_core::{Result, Song, SongId, TokenCounts};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LyricsEntry {
    Counts(TokenCounts),
    Text(String),
}

/// Load the track table.
///
/// # Errors
/// Fails if the file cannot be read or is not an array of track records.
pub fn load_tracks(path: impl AsRef<Path>) -> Result<Vec<Song>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let songs: Vec<Song> = serde_json::from_reader(reader)?;
    log::info!("Loaded {} tracks from {}", songs.len(), path.display());
    Ok(songs)
}

/// Load the lyrics table as token counts per song.
///
/// Entries that end up with no tokens are kept: an empty document still
/// counts toward the number of lyric documents.
///
/// # Errors
/// Fails if the file cannot be read or is not a JSON object.
pub fn load_lyrics(path: impl AsRef<Path>) -> Result<BTreeMap<SongId, TokenCounts>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let raw: BTreeMap<SongId, LyricsEntry> = serde_json::from_reader(reader)?;

    let mut from_text = 0usize;
    let lyrics: BTreeMap<SongId, TokenCounts> = raw
        .into_iter()
        .map(|(id, entry)| {
            let counts = match entry {
                LyricsEntry::Counts(counts) => counts,
                LyricsEntry::Text(text) => {
                    from_text += 1;
                    lyric_token_counts(&text)
                }
            };
            (id, counts)
        })
        .collect();

    log::info!(
        "Loaded lyrics for {} songs from {} ({} tokenized from text)",
        lyrics.len(),
        path.display(),
        from_text
    );
    Ok(lyrics)
}
