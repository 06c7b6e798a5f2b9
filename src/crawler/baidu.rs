//! Baidu image search via the `acjson` endpoint (30 results per page).

use super::{fetch_text, url_with_params, CrawlerError, ImageHit, ImageSource, PoliteClient};
use reqwest::Url;
use serde_json::Value;

const SEARCH_URL: &str = "https://image.baidu.com/search/acjson";
pub const PAGE_SIZE: u32 = 30;

pub struct BaiduSource<'a> {
    client: &'a mut PoliteClient,
}

impl<'a> BaiduSource<'a> {
    pub fn new(client: &'a mut PoliteClient) -> Self {
        Self { client }
    }
}

pub fn search_url(keyword: &str, page: u32, gif: bool) -> Result<Url, CrawlerError> {
    let mut params = vec![
        ("tn", "resultjson_com".to_string()),
        ("word", keyword.to_string()),
        ("pn", (page * PAGE_SIZE).to_string()),
        ("rn", PAGE_SIZE.to_string()),
        ("ct", "1".to_string()),
        ("ic", "0".to_string()),
        ("lm", "-1".to_string()),
        ("nc", "1".to_string()),
        ("ie", "utf-8".to_string()),
        ("oe", "utf-8".to_string()),
        ("face", "0".to_string()),
    ];
    if gif {
        params.push(("f", "gif".to_string()));
    }
    url_with_params(SEARCH_URL, &params)
}

/// Entries with both `thumbURL` and `middleURL`; the middle-size URL is the one downloaded.
pub fn parse_response(body: &str, keyword: &str) -> Result<Vec<ImageHit>, CrawlerError> {
    // acjson sometimes escapes single quotes, which is not valid JSON.
    let cleaned = body.replace("\\'", "'");
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| CrawlerError::Parse {
        engine: "baidu",
        message: e.to_string(),
    })?;
    let Some(items) = value.get("data").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter(|item| item.get("thumbURL").and_then(Value::as_str).is_some())
        .filter_map(|item| {
            let url = item.get("middleURL").and_then(Value::as_str)?;
            if url.is_empty() {
                return None;
            }
            Some(ImageHit {
                url: url.to_string(),
                title: item
                    .get("fromPageTitle")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                keyword: keyword.to_string(),
            })
        })
        .collect())
}

impl ImageSource for BaiduSource<'_> {
    fn search_page(
        &mut self,
        keyword: &str,
        page: u32,
        gif: bool,
    ) -> Result<Vec<ImageHit>, CrawlerError> {
        let url = search_url(keyword, page, gif)?;
        let body = fetch_text(self.client, &url)?;
        parse_response(&body, keyword)
    }
}
