//! Unsplash search through the public `napi` JSON endpoint.

use super::{fetch_text, url_with_params, CrawlerError, ImageHit, ImageSource, PoliteClient};
use reqwest::Url;
use serde::Deserialize;

const SEARCH_URL: &str = "https://unsplash.com/napi/search/photos";
pub const PAGE_SIZE: u32 = 10;

pub struct UnsplashSource<'a> {
    client: &'a mut PoliteClient,
}

impl<'a> UnsplashSource<'a> {
    pub fn new(client: &'a mut PoliteClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    alt_description: Option<String>,
    #[serde(default)]
    urls: Option<PhotoUrls>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
}

pub fn search_url(keyword: &str, page: u32) -> Result<Url, CrawlerError> {
    url_with_params(
        SEARCH_URL,
        &[
            ("query", keyword.to_string()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", (page + 1).to_string()),
        ],
    )
}

/// Photos that have a `urls.regular` entry.
pub fn parse_response(body: &str, keyword: &str) -> Result<Vec<ImageHit>, CrawlerError> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| CrawlerError::Parse {
        engine: "unsplash",
        message: e.to_string(),
    })?;
    Ok(parsed
        .results
        .into_iter()
        .filter_map(|p| {
            let url = p.urls?.regular?;
            Some(ImageHit {
                url,
                title: p.alt_description.unwrap_or_default(),
                keyword: keyword.to_string(),
            })
        })
        .collect())
}

impl ImageSource for UnsplashSource<'_> {
    fn search_page(
        &mut self,
        keyword: &str,
        page: u32,
        _gif: bool,
    ) -> Result<Vec<ImageHit>, CrawlerError> {
        let url = search_url(keyword, page)?;
        let body = fetch_text(self.client, &url)?;
        parse_response(&body, keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uses_regular_urls() -> Result<(), CrawlerError> {
        let body = r#"{
            "total": 3,
            "results": [
                {"id": "a", "alt_description": "microscopic view of neurons", "urls": {"raw": "r", "regular": "https://images.unsplash.com/photo-a?w=1080"}},
                {"id": "b", "alt_description": null, "urls": {"regular": "https://images.unsplash.com/photo-b"}},
                {"id": "c", "urls": {"small": "https://images.unsplash.com/photo-c"}}
            ]
        }"#;
        let hits = parse_response(body, "neurons")?;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://images.unsplash.com/photo-a?w=1080");
        assert_eq!(hits[0].title, "microscopic view of neurons");
        assert_eq!(hits[1].title, "");
        Ok(())
    }

    #[test]
    fn parse_empty_results() -> Result<(), CrawlerError> {
        assert!(parse_response("{}", "x")?.is_empty());
        Ok(())
    }

    #[test]
    fn search_url_is_one_based() -> Result<(), CrawlerError> {
        let url = search_url("stem cells", 0)?;
        assert!(url.as_str().contains("page=1"));
        assert!(url.as_str().contains("query=stem+cells"));
        Ok(())
    }
}
