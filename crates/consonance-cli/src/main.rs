use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use consonance_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "consonance", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the corpus bundle (default: ~/.local/share/consonance/corpus.json.gz)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Build the corpus bundle from a track table and a lyrics table
    ///
    /// Reads two JSON files:
    ///
    /// - tracks: an array of records with an id (or uri), artist name, track
    ///   name and the twelve audio descriptor columns (acousticness,
    ///   danceability, energy, instrumentalness, key, liveness, loudness,
    ///   mode, speechiness, tempo, time_signature, valence)
    /// - lyrics: an object mapping each song id to token counts or to raw
    ///   lyric text
    ///
    /// Only tracks with lyrics enter the corpus. The lyric index (postings,
    /// vocabulary, IDF, song norms), the standardized audio feature matrix
    /// and the song records are written together as one gzip-compressed
    /// bundle, which `consonance recommend` loads whole.
    Build {
        /// Track table (JSON array)
        #[arg(long)]
        tracks: PathBuf,

        /// Lyrics table (JSON object)
        #[arg(long)]
        lyrics: PathBuf,

        /// Newline-separated stopword list (default: built-in English list)
        #[arg(long)]
        stopwords: Option<PathBuf>,

        /// Keep stopwords and non-alphabetic tokens in the index
        #[arg(long)]
        keep_stopwords: bool,

        /// Minimum number of songs a token must appear in
        #[arg(long)]
        min_df: Option<usize>,

        /// Maximum share of songs a token may appear in (0.0 to 1.0)
        #[arg(long)]
        max_df_ratio: Option<f64>,
    },
    /// Recommend songs similar to a query song
    ///
    /// The query is either "artist | title" or a Spotify track URI given
    /// with --uri. The song is resolved through Spotify (metadata and audio
    /// features) and, when lyrics are weighted, Genius (lyrics). Results
    /// are printed as "(score) artist | title", best first.
    Recommend {
        /// Query in the form "artist | title"
        #[arg(required_unless_present = "uri", conflicts_with = "uri")]
        query: Option<String>,

        /// Query by Spotify track URI instead of by name
        #[arg(long)]
        uri: Option<String>,

        /// Share of lyric similarity in the score, 0.0 (audio only) to 1.0
        #[arg(short, long)]
        weight: Option<f64>,

        /// Number of results
        #[arg(short = 'n', long = "results")]
        n: Option<usize>,

        /// Only rank songs that share lyric tokens with the query
        #[arg(long)]
        lyrics_only: bool,

        /// Also print the separate audio and lyric scores
        #[arg(long)]
        scores: bool,
    },
    /// Inspect the lyric vocabulary of the corpus
    Vocab {
        /// Look up a single token
        token: Option<String>,

        /// Number of tokens to list
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show corpus and configuration status
    Status {
        /// Print corpus statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file when no key is given
    Get { key: Option<String> },
    /// Set a value in the config file (dotted keys for tables, e.g. index.min_df)
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.corpus {
        Some(path) => Config::load_with_corpus_path(path)?,
        None => Config::load()?,
    };

    if let Err(e) = twyg::setup(config.logging.to_opts()?) {
        eprintln!("Failed to set up logging: {e}");
    }

    match cli.command {
        Commands::Build {
            tracks,
            lyrics,
            stopwords,
            keep_stopwords,
            min_df,
            max_df_ratio,
        } => {
            let mut settings = config.index.clone();
            if stopwords.is_some() {
                settings.stopwords_path = stopwords;
            }
            if keep_stopwords {
                settings.options.remove_stopwords = false;
            }
            if let Some(min_df) = min_df {
                settings.options.min_df = min_df;
            }
            if let Some(ratio) = max_df_ratio {
                settings.options.max_df_ratio = ratio;
            }
            commands::run_build(&tracks, &lyrics, &settings, &config.corpus_path)?;
        }
        Commands::Recommend {
            query,
            uri,
            weight,
            n,
            lyrics_only,
            scores,
        } => {
            let request = commands::RecommendRequest {
                query,
                uri,
                weight: weight.unwrap_or(config.lyrics_weight),
                n_results: n.unwrap_or(config.n_results),
                lyrics_only,
                show_scores: scores,
            };
            commands::run_recommend(&config, request).await?;
        }
        Commands::Vocab { token, limit } => {
            commands::show_vocab(&config.corpus_path, token.as_deref(), limit)?;
        }
        Commands::Status { json } => {
            commands::show_status(&config, json)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Get { key } => commands::config::get_config(&config, key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
