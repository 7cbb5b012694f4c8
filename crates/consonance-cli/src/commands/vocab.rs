use std::path::Path;

use anyhow::{Context, Result};
use consonance_search::Corpus;

/// List the lyric vocabulary, or show one token's entry.
pub fn show_vocab(corpus_path: &Path, token: Option<&str>, limit: usize) -> Result<()> {
    let corpus = Corpus::load(corpus_path)
        .with_context(|| format!("Failed to load corpus from {}", corpus_path.display()))?;
    let lyrics = &corpus.lyrics;

    if let Some(token) = token {
        let token = token.to_lowercase();
        match lyrics.index.vocab_index(&token) {
            Some(index) => {
                println!("Token: {token}");
                println!("  Index: {index}");
                println!("  Songs: {}", lyrics.index.document_frequency(&token));
                match lyrics.idf.get(&token) {
                    Some(idf) => println!("  IDF: {idf:.4}"),
                    None => println!("  IDF: none (outside document frequency bounds)"),
                }
            }
            None => println!("Token '{token}' is not in the vocabulary"),
        }
        return Ok(());
    }

    let vocabulary = lyrics.index.vocabulary();
    println!("Vocabulary: {} tokens\n", vocabulary.len());
    println!("{:>7}  {:<20} {:>7} {:>9}", "index", "token", "songs", "idf");
    for (token, index) in vocabulary.iter().take(limit) {
        let idf = lyrics
            .idf
            .get(token)
            .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        println!(
            "{:>7}  {:<20} {:>7} {:>9}",
            index,
            token,
            lyrics.index.document_frequency(token),
            idf
        );
    }
    if vocabulary.len() > limit {
        println!("\n... {} more (use --limit)", vocabulary.len() - limit);
    }
    Ok(())
}
