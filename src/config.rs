//! Optional config file loading. Search order: ./bookpress.toml, then
//! $XDG_CONFIG_HOME/bookpress/config.toml (or ~/.config/bookpress/config.toml).

use crate::model::BookLayout;
use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Project root when --project is not set. Relative paths are resolved against CWD.
    pub project_dir: Option<PathBuf>,
    /// Replaces the built-in book layout entirely.
    pub book: Option<BookLayout>,
    pub images: ImagesConfig,
    pub render: RenderConfig,
    pub crawler: CrawlerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Image paths (relative to the images directory) always treated as used.
    pub known_used: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// HTML-to-PDF program (default weasyprint).
    pub program: Option<String>,
    /// Argument template; {base}, {input} and {output} are substituted.
    pub args: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub delay_min_secs: Option<f64>,
    pub delay_max_secs: Option<f64>,
    /// Number of HTTP attempts for transient failures (default 3).
    pub retry_count: Option<u32>,
    /// Delay in seconds before each retry, e.g. [2, 4].
    pub retry_backoff_secs: Option<Vec<u64>>,
}

/// Search order: (1) ./bookpress.toml, (2) $XDG_CONFIG_HOME/bookpress/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("bookpress.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("bookpress").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config = parse_config(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}

/// Parse config text; a `[book]` table must also pass layout validation.
pub fn parse_config(s: &str) -> Result<Config, String> {
    let config: Config = toml::from_str(s).map_err(|e| e.to_string())?;
    if let Some(book) = &config.book {
        book.validate().map_err(|e| e.to_string())?;
    }
    Ok(config)
}
