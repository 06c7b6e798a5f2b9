//! Error type for image search, download and crawl profiles.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body: {source}")]
    BodyRead {
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not parse {engine} response: {message}")]
    Parse {
        engine: &'static str,
        message: String,
    },

    #[error("Unknown crawl profile '{name}'. Built-in profiles: {available}.")]
    UnknownProfile { name: String, available: String },

    #[error("Invalid crawl profile {path}: {message}")]
    ProfileFile { path: PathBuf, message: String },

    #[error("Invalid crawl profile: {0}")]
    InvalidProfile(String),

    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize download report: {0}")]
    Report(#[from] serde_json::Error),
}
