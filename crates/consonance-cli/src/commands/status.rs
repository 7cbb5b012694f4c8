use anyhow::Result;
use consonance_etl::{config, Config};
use consonance_search::Corpus;

pub fn show_status(config: &Config, json: bool) -> Result<()> {
    let corpus = if config.corpus_path.exists() {
        Some(Corpus::load(&config.corpus_path)?)
    } else {
        None
    };

    if json {
        let stats = corpus.as_ref().map(Corpus::stats);
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n📊 Consonance Status\n");
    println!("  Corpus: {}", config.corpus_path.display());
    match &corpus {
        Some(corpus) => {
            let stats = corpus.stats();
            println!("  Built: {}", stats.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Songs: {}", stats.songs);
            println!("  Lyric documents: {}", stats.lyric_documents);
            println!(
                "  Indexed tokens: {} ({} with IDF)",
                stats.indexed_tokens, stats.idf_tokens
            );
            println!("  Audio matrix rows: {}", stats.matrix_rows);
        }
        None => {
            println!("  No corpus yet");
            println!("\n  Run `consonance build --tracks <file> --lyrics <file>` to create one");
        }
    }

    println!("\n  Config file: {}", config::config_file_path().display());
    println!(
        "  Spotify credentials: {}",
        set_or_missing(config.spotify_client_id.is_some() && config.spotify_client_secret.is_some())
    );
    println!("  Genius token: {}", set_or_missing(config.genius_token.is_some()));

    Ok(())
}

fn set_or_missing(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "missing"
    }
}
