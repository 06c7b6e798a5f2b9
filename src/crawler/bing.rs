//! Bing image search. Results are scraped from `img.mimg` thumbnails on the HTML results page.

use super::{fetch_text, url_with_params, CrawlerError, ImageHit, ImageSource, PoliteClient};
use reqwest::Url;
use scraper::{Html, Selector};

const SEARCH_URL: &str = "https://www.bing.com/images/search";
pub const PAGE_SIZE: u32 = 20;

pub struct BingSource<'a> {
    client: &'a mut PoliteClient,
}

impl<'a> BingSource<'a> {
    pub fn new(client: &'a mut PoliteClient) -> Self {
        Self { client }
    }
}

pub fn search_url(keyword: &str, page: u32) -> Result<Url, CrawlerError> {
    url_with_params(
        SEARCH_URL,
        &[
            ("q", keyword.to_string()),
            ("first", (page * PAGE_SIZE + 1).to_string()),
            ("count", PAGE_SIZE.to_string()),
            ("mkt", "en-US".to_string()),
        ],
    )
}

/// Thumbnails with an absolute `src`; lazy-loaded placeholders are skipped.
pub fn parse_results(html: &str, keyword: &str) -> Result<Vec<ImageHit>, CrawlerError> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse("img.mimg").map_err(|e| CrawlerError::Parse {
        engine: "bing",
        message: e.to_string(),
    })?;
    Ok(doc
        .select(&sel)
        .filter_map(|img| {
            let src = img.value().attr("src")?;
            if !src.starts_with("http") {
                return None;
            }
            Some(ImageHit {
                url: src.to_string(),
                title: img.value().attr("alt").unwrap_or_default().to_string(),
                keyword: keyword.to_string(),
            })
        })
        .collect())
}

impl ImageSource for BingSource<'_> {
    fn search_page(
        &mut self,
        keyword: &str,
        page: u32,
        _gif: bool,
    ) -> Result<Vec<ImageHit>, CrawlerError> {
        let url = search_url(keyword, page)?;
        let body = fetch_text(self.client, &url)?;
        parse_results(&body, keyword)
    }
}
