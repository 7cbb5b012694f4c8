use anyhow::{Context, Result};
use consonance_etl::{config, Config};
use toml_edit::{value, DocumentMut, Item};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Integer,
    Float,
    Bool,
}

/// Keys accepted by `config get` and `config set`.
const KEYS: &[(&str, Kind)] = &[
    ("spotify_client_id", Kind::Text),
    ("spotify_client_secret", Kind::Text),
    ("genius_token", Kind::Text),
    ("include_annotations", Kind::Bool),
    ("corpus_path", Kind::Text),
    ("request_timeout_secs", Kind::Integer),
    ("lyrics_weight", Kind::Float),
    ("n_results", Kind::Integer),
    ("candidates", Kind::Text),
    ("index.remove_stopwords", Kind::Bool),
    ("index.min_df", Kind::Integer),
    ("index.max_df_ratio", Kind::Float),
    ("index.stopwords_path", Kind::Text),
    ("logging.level", Kind::Text),
    ("logging.coloured", Kind::Bool),
    ("logging.report_caller", Kind::Bool),
];

fn valid_keys() -> String {
    KEYS.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
}

fn secret(value: Option<&String>) -> &'static str {
    if value.is_some() {
        "<set>"
    } else {
        "<not set>"
    }
}

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!(
        "  spotify_client_id: {}",
        config.spotify_client_id.as_deref().unwrap_or("<not set>")
    );
    println!(
        "  spotify_client_secret: {}",
        secret(config.spotify_client_secret.as_ref())
    );
    println!("  genius_token: {}", secret(config.genius_token.as_ref()));
    println!("  include_annotations: {}", config.include_annotations);
    println!("  corpus_path: {}", config.corpus_path.display());
    println!("  request_timeout_secs: {}", config.request_timeout_secs);
    println!("  lyrics_weight: {}", config.lyrics_weight);
    println!("  n_results: {}", config.n_results);
    println!("  candidates: {:?}", config.candidates);
    println!("  index.remove_stopwords: {}", config.index.options.remove_stopwords);
    println!("  index.min_df: {}", config.index.options.min_df);
    println!("  index.max_df_ratio: {}", config.index.options.max_df_ratio);
    println!(
        "  index.stopwords_path: {}",
        config
            .index
            .stopwords_path
            .as_ref()
            .map_or_else(|| "<built-in English>".to_string(), |p| p.display().to_string())
    );
    println!("  logging.level: {}", config.logging.level);
    println!("  logging.coloured: {}", config.logging.coloured);

    println!("\nPriority: CLI args > ENV vars (CONSONANCE_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(config: &Config, key: Option<String>) -> Result<()> {
    let Some(key) = key else {
        let config_path = config::config_file_path();
        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'consonance config init' to create it.");
        }
        return Ok(());
    };

    let not_set = || String::from("<not set>");
    let shown = match key.as_str() {
        "spotify_client_id" => config.spotify_client_id.clone().unwrap_or_else(not_set),
        "spotify_client_secret" => config.spotify_client_secret.clone().unwrap_or_else(not_set),
        "genius_token" => config.genius_token.clone().unwrap_or_else(not_set),
        "include_annotations" => config.include_annotations.to_string(),
        "corpus_path" => config.corpus_path.display().to_string(),
        "request_timeout_secs" => config.request_timeout_secs.to_string(),
        "lyrics_weight" => config.lyrics_weight.to_string(),
        "n_results" => config.n_results.to_string(),
        "candidates" => serde_json::to_string(&config.candidates)?.trim_matches('"').to_string(),
        "index.remove_stopwords" => config.index.options.remove_stopwords.to_string(),
        "index.min_df" => config.index.options.min_df.to_string(),
        "index.max_df_ratio" => config.index.options.max_df_ratio.to_string(),
        "index.stopwords_path" => config
            .index
            .stopwords_path
            .as_ref()
            .map_or_else(not_set, |p| p.display().to_string()),
        "logging.level" => config.logging.level.clone(),
        "logging.coloured" => config.logging.coloured.to_string(),
        "logging.report_caller" => config.logging.report_caller.to_string(),
        _ => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, valid_keys()),
    };
    println!("{shown}");
    Ok(())
}

/// Set `key` to `value` in a config document, keeping comments and layout.
fn apply_setting(contents: &str, key: &str, raw: &str) -> Result<String> {
    let kind = KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}\n\nValid keys: {}", key, valid_keys()))?;

    let item: Item = match kind {
        Kind::Text => value(raw),
        Kind::Integer => value(
            raw.parse::<i64>()
                .with_context(|| format!("{key} expects an integer, got '{raw}'"))?,
        ),
        Kind::Float => value(
            raw.parse::<f64>()
                .with_context(|| format!("{key} expects a number, got '{raw}'"))?,
        ),
        Kind::Bool => value(
            raw.parse::<bool>()
                .with_context(|| format!("{key} expects true or false, got '{raw}'"))?,
        ),
    };

    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Failed to parse config file")?;

    match key.split_once('.') {
        Some((table, field)) => {
            let table = doc
                .as_table_mut()
                .entry(table)
                .or_insert(toml_edit::table())
                .as_table_mut()
                .ok_or_else(|| anyhow::anyhow!("'{table}' in the config file is not a table"))?;
            table[field] = item;
        }
        None => {
            doc[key] = item;
        }
    }

    Ok(doc.to_string())
}

/// Set a config value.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();

    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = apply_setting(&contents, key, raw)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure consonance.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
