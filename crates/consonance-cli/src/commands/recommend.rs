use std::sync::Arc;

use anyhow::{Context, Result};
use consonance_core::SongId;
use consonance_etl::{
    Config, GeniusClient, LyricsProvider, NoLyrics, QueryInput, Recommendations, Recommender,
    SpotifyClient,
};
use consonance_search::{CandidateSet, Corpus, SimilarityEngine};

/// One `consonance recommend` invocation, with config defaults applied.
#[derive(Debug)]
pub struct RecommendRequest {
    pub query: Option<String>,
    pub uri: Option<String>,
    pub weight: f64,
    pub n_results: usize,
    pub lyrics_only: bool,
    pub show_scores: bool,
}

pub async fn run_recommend(config: &Config, request: RecommendRequest) -> Result<()> {
    let input = match (&request.uri, &request.query) {
        (Some(uri), _) => QueryInput::Id(SongId::new(uri.as_str())),
        (None, Some(text)) => QueryInput::parse(text)?,
        (None, None) => anyhow::bail!("Give a query as \"artist | title\" or use --uri"),
    };

    let corpus = Corpus::load(&config.corpus_path).with_context(|| {
        format!(
            "Failed to load corpus from {} (run `consonance build` first)",
            config.corpus_path.display()
        )
    })?;
    let candidates = if request.lyrics_only {
        CandidateSet::LyricsOnly
    } else {
        config.candidates
    };
    let engine = SimilarityEngine::new(Arc::new(corpus)).with_candidates(candidates);

    let metadata = SpotifyClient::from_config(config)?;
    let lyrics = lyrics_provider(config, request.weight)?;
    let recommender = Recommender::new(
        engine,
        Arc::new(metadata),
        lyrics,
        config.request_timeout(),
    );

    let recs = recommender
        .recommend(&input, request.weight, request.n_results)
        .await
        .with_context(|| format!("No recommendations for {input}"))?;

    print_results(&recs, request.show_scores);
    Ok(())
}

/// Genius when lyrics carry weight; audio-only queries need no lyrics
/// provider and so no Genius token.
fn lyrics_provider(config: &Config, weight: f64) -> Result<Arc<dyn LyricsProvider>> {
    if weight > 0.0 {
        Ok(Arc::new(GeniusClient::from_config(config)?))
    } else {
        Ok(Arc::new(NoLyrics))
    }
}

fn print_results(recs: &Recommendations, show_scores: bool) {
    println!("\nSongs like {} ({})\n", recs.query.label(), recs.query.id);
    if recs.results.is_empty() {
        println!("  No similar songs in the corpus");
    }
    for rec in &recs.results {
        println!("({:.4}) {}", rec.score, rec.song.label());
        if show_scores {
            match rec.lyric_score {
                Some(lyrics) => println!(
                    "         audio {:.4}  lyrics {:.4}",
                    rec.audio_score, lyrics
                ),
                None => println!("         audio {:.4}", rec.audio_score),
            }
        }
    }
    println!("\nTook {:.2?}", recs.elapsed);
}
