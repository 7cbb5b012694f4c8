use std::path::Path;

use anyhow::Result;
use consonance_etl::{build_corpus, IndexSettings};

pub fn run_build(
    tracks: &Path,
    lyrics: &Path,
    settings: &IndexSettings,
    output: &Path,
) -> Result<()> {
    println!("Building corpus");
    println!("  Tracks: {}", tracks.display());
    println!("  Lyrics: {}", lyrics.display());
    log::debug!("Index settings: {:?}", settings);

    let report = build_corpus(tracks, lyrics, settings, output)?;

    println!(
        "  ✓ Read {} tracks and {} lyric documents",
        report.tracks_read, report.lyric_documents
    );
    println!(
        "  ✓ Indexed {} songs, {} tokens ({} with IDF)",
        report.stats.songs, report.stats.indexed_tokens, report.stats.idf_tokens
    );
    println!(
        "  ✓ Audio feature matrix: {} rows",
        report.stats.matrix_rows
    );
    println!(
        "\n✓ Wrote {} in {:.2?}",
        output.display(),
        report.elapsed
    );
    Ok(())
}
