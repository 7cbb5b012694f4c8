use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use consonance_core::text::Stopwords;
use consonance_search::{CandidateSet, IndexOptions};

/// Configuration for consonance.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CONSONANCE_* prefix)
/// 3. Config file (~/.config/consonance/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spotify application client id (metadata and audio features).
    ///
    /// Can be set via:
    /// - ENV: CONSONANCE_SPOTIFY_CLIENT_ID
    /// - Config: spotify_client_id = "..."
    pub spotify_client_id: Option<String>,

    /// Spotify application client secret.
    pub spotify_client_secret: Option<String>,

    /// Genius API access token (lyrics).
    ///
    /// Can be set via:
    /// - ENV: CONSONANCE_GENIUS_TOKEN
    /// - Config: genius_token = "..."
    pub genius_token: Option<String>,

    /// Append Genius annotation text to fetched query lyrics.
    ///
    /// Can be set via:
    /// - ENV: CONSONANCE_INCLUDE_ANNOTATIONS
    /// - Config: include_annotations = false
    pub include_annotations: bool,

    /// Path to the persisted corpus bundle.
    ///
    /// Can be set via:
    /// - CLI: --corpus /path/to/corpus.json.gz
    /// - ENV: CONSONANCE_CORPUS_PATH
    /// - Config: corpus_path = "/path/to/corpus.json.gz"
    /// - Default: ~/.local/share/consonance/corpus.json.gz
    pub corpus_path: PathBuf,

    /// Timeout applied to every provider call, in seconds.
    pub request_timeout_secs: u64,

    /// Default share of lyric similarity in the fused score.
    pub lyrics_weight: f64,

    /// Default number of results per query.
    pub n_results: usize,

    pub index: IndexSettings,

    /// Fusion candidate set when lyrics are weighted.
    pub candidates: CandidateSet,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify_client_id: None,
            spotify_client_secret: None,
            genius_token: None,
            include_annotations: true,
            corpus_path: default_corpus_path(),
            request_timeout_secs: 30,
            lyrics_weight: 0.5,
            n_results: 10,
            index: IndexSettings::default(),
            candidates: CandidateSet::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The `[index]` table: lyric index tunables plus the stopword source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    #[serde(flatten)]
    pub options: IndexOptions,

    /// Newline-separated stopword file; the built-in English list is used
    /// when unset.
    pub stopwords_path: Option<PathBuf>,
}

impl IndexSettings {
    /// The stopword set handed to the index builder.
    pub fn stopwords(&self) -> Result<Stopwords> {
        match &self.stopwords_path {
            Some(path) => Stopwords::load(path)
                .with_context(|| format!("Failed to load stopwords from {}", path.display())),
            None => Ok(Stopwords::english()),
        }
    }
}

/// The `[logging]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,
    pub coloured: bool,
    pub report_caller: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            coloured: true,
            report_caller: false,
        }
    }
}

impl LoggingConfig {
    /// Build logger options for `twyg::setup`.
    pub fn to_opts(&self) -> Result<twyg::Opts> {
        let level = match self.level.to_ascii_lowercase().as_str() {
            "trace" => twyg::LogLevel::Trace,
            "debug" => twyg::LogLevel::Debug,
            "info" => twyg::LogLevel::Info,
            "warn" | "warning" => twyg::LogLevel::Warn,
            "error" => twyg::LogLevel::Error,
            other => anyhow::bail!("Unknown log level: {other}"),
        };
        twyg::OptsBuilder::new()
            .coloured(self.coloured)
            .level(level)
            .report_caller(self.report_caller)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid logging options: {e}"))
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/consonance/config.toml
    /// Reads environment variables with CONSONANCE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("consonance");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom corpus path (the --corpus flag).
    pub fn load_with_corpus_path(corpus_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.corpus_path = corpus_path;
        Ok(config)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Default corpus location: ~/.local/share/consonance/corpus.json.gz (or
/// platform equivalent).
fn default_corpus_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("consonance")
        .join("corpus.json.gz")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/consonance/config.toml
/// - macOS: ~/Library/Application Support/consonance/config.toml
/// - Windows: %APPDATA%\consonance\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("consonance")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Consonance Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CONSONANCE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Spotify client credentials, used to resolve songs and fetch audio features.
# Create an app at: https://developer.spotify.com/dashboard
#
# Can also be set via:
# - Environment: CONSONANCE_SPOTIFY_CLIENT_ID / CONSONANCE_SPOTIFY_CLIENT_SECRET
spotify_client_id = "your-spotify-client-id"
spotify_client_secret = "your-spotify-client-secret"

# Genius API token, used to fetch lyrics.
# Create a client at: https://genius.com/api-clients
#
# Can also be set via:
# - Environment: CONSONANCE_GENIUS_TOKEN=your-token
genius_token = "your-genius-token"

# Append Genius annotation text to the query song's lyrics. Build the corpus
# from lyrics that include annotations too when this is on.
include_annotations = true

# Path to the corpus bundle written by `consonance build`
#
# Can also be set via:
# - CLI: consonance --corpus /custom/corpus.json.gz recommend ...
# - Environment: CONSONANCE_CORPUS_PATH=/custom/corpus.json.gz
#
# Default: Platform-specific data directory
#corpus_path = "/path/to/corpus.json.gz"

# Seconds to wait for each provider call before giving up
request_timeout_secs = 30

# Share of lyric similarity in the fused score (0.0 = audio only)
lyrics_weight = 0.5

# Number of recommendations to return
n_results = 10

# Which songs are ranked when lyrics are weighted:
# "union" ranks every song, "lyrics_only" only songs sharing lyric tokens
candidates = "union"

[index]
remove_stopwords = true
min_df = 1
max_df_ratio = 1.0
# Newline-separated stopword list; defaults to the built-in English list
#stopwords_path = "/path/to/stopwords.txt"

[logging]
level = "info"
coloured = true
report_caller = false
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
