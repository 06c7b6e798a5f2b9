//! Image crawlers. Search engines, shared client, category profiles, and the download loop.

mod client;
mod error;

pub mod baidu;
pub mod bing;
pub mod profile;
pub mod report;
pub mod run;
pub mod unsplash;

pub use client::{PoliteClient, PoliteClientBuilder, DEFAULT_USER_AGENT};
pub use error::CrawlerError;
pub use profile::{builtin_profile, CategoryProfile, BUILTIN_PROFILES};
pub use report::DownloadReport;
pub use run::{run_crawl, CrawlBackend, CrawlOptions, CrawlSummary, HttpBackend};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Image search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Baidu,
    Bing,
    Unsplash,
}

impl SearchEngine {
    pub fn name(self) -> &'static str {
        match self {
            SearchEngine::Baidu => "baidu",
            SearchEngine::Bing => "bing",
            SearchEngine::Unsplash => "unsplash",
        }
    }
}

/// One search result worth downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHit {
    /// URL to download (Baidu's middle-size image, Bing's thumbnail, Unsplash's regular size).
    pub url: String,
    /// Page title or alt text, used for categorization.
    pub title: String,
    /// Keyword that produced this hit.
    pub keyword: String,
}

/// Implemented by each search engine adapter.
pub trait ImageSource {
    /// Search one result page (0-based). `gif` asks for animated results where the engine supports it.
    fn search_page(
        &mut self,
        keyword: &str,
        page: u32,
        gif: bool,
    ) -> Result<Vec<ImageHit>, CrawlerError>;
}

/// Build a URL with query parameters.
pub(crate) fn url_with_params(base: &str, params: &[(&str, String)]) -> Result<Url, CrawlerError> {
    Url::parse_with_params(base, params.iter().map(|(k, v)| (*k, v.as_str()))).map_err(|e| {
        CrawlerError::InvalidUrl {
            input: base.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Fetch with retries and return the body of a successful response.
pub(crate) fn fetch_text(client: &mut PoliteClient, url: &Url) -> Result<String, CrawlerError> {
    let response = client
        .get_with_retry(url.as_str())
        .map_err(|e| CrawlerError::Network {
            url: url.to_string(),
            source: e,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(CrawlerError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    response
        .text()
        .map_err(|e| CrawlerError::BodyRead { source: e })
}

/// Search `pages` result pages on one engine. A failing page is logged and skipped.
pub fn search_images(
    engine: SearchEngine,
    client: &mut PoliteClient,
    keyword: &str,
    pages: u32,
    gif: bool,
) -> Vec<ImageHit> {
    let mut source: Box<dyn ImageSource + '_> = match engine {
        SearchEngine::Baidu => Box::new(baidu::BaiduSource::new(client)),
        SearchEngine::Bing => Box::new(bing::BingSource::new(client)),
        SearchEngine::Unsplash => Box::new(unsplash::UnsplashSource::new(client)),
    };
    let mut hits = Vec::new();
    for page in 0..pages {
        match source.search_page(keyword, page, gif) {
            Ok(found) => {
                info!(
                    "{} '{}' page {}: {} images",
                    engine.name(),
                    keyword,
                    page + 1,
                    found.len()
                );
                let empty = found.is_empty();
                hits.extend(found);
                if empty {
                    break;
                }
            }
            Err(e) => error!("{} search failed for '{}' page {}: {}", engine.name(), keyword, page + 1, e),
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_params_are_encoded() {
        let url = url_with_params(
            "https://www.bing.com/images/search",
            &[("q", "red blood cells".to_string()), ("first", "21".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.bing.com/images/search?q=red+blood+cells&first=21"
        );
    }

    #[test]
    fn invalid_base_url_errors() {
        assert!(matches!(
            url_with_params("not a url", &[]),
            Err(CrawlerError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn engine_names_round_trip_through_serde() {
        let e: SearchEngine = serde_json::from_str("\"unsplash\"").unwrap();
        assert_eq!(e, SearchEngine::Unsplash);
        assert_eq!(e.name(), "unsplash");
    }
}
