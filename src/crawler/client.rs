//! Blocking HTTP client that waits a random interval between requests and retries transient failures.

use rand::Rng;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_HTML_AND_IMAGES: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_CHINESE_FIRST: &str = "zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3";

/// Attempts per request, first try included.
const ATTEMPTS: u32 = 3;
const BACKOFF_SECS: [u64; 2] = [2, 4];
/// Waits after HTTP 429; search endpoints throttle for tens of seconds.
const RATE_LIMIT_WAIT_SECS: [u64; 3] = [30, 60, 90];

/// Blocking HTTP client with browser-like headers and a randomized delay between requests.
#[derive(Debug)]
pub struct PoliteClient {
    http: Client,
    pause: RangeInclusive<f64>,
    sent_at: Option<Instant>,
    attempts: u32,
    backoff: Vec<u64>,
}

impl PoliteClient {
    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// GET with retries on timeouts, connection errors, HTTP 5xx and HTTP 429.
    ///
    /// Other errors return immediately. After the last attempt the response is returned
    /// whatever its status, so callers still check it.
    pub fn get_with_retry(&mut self, url: &str) -> Result<Response, reqwest::Error> {
        let mut attempt: u32 = 0;
        loop {
            self.pause_before_request();
            let sent = self.http.get(url).send();
            self.sent_at = Some(Instant::now());
            let final_try = attempt + 1 >= self.attempts;

            let wait = match &sent {
                Ok(_) if final_try => None,
                Ok(r) if r.status().as_u16() == 429 => {
                    tracing::debug!("Rate limited by {}; waiting", url);
                    Some(step(&RATE_LIMIT_WAIT_SECS, attempt, 60))
                }
                Ok(r) if r.status().is_server_error() => {
                    tracing::debug!("HTTP {} from {}; retrying", r.status(), url);
                    Some(step(&self.backoff, attempt, 1))
                }
                Err(e) if !final_try && (e.is_timeout() || e.is_connect()) => {
                    tracing::debug!("{} for {}; retrying", e, url);
                    Some(step(&self.backoff, attempt, 1))
                }
                _ => None,
            };
            match wait {
                Some(secs) => std::thread::sleep(Duration::from_secs(secs)),
                None => return sent,
            }
            attempt += 1;
        }
    }

    /// Pause before the next request: uniform within the configured range.
    pub fn next_delay(&self) -> Duration {
        let (lo, hi) = (*self.pause.start(), *self.pause.end());
        let secs = if hi > lo {
            rand::rng().random_range(lo..=hi)
        } else {
            lo
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn pause_before_request(&self) {
        let Some(sent_at) = self.sent_at else {
            return;
        };
        let remaining = self.next_delay().saturating_sub(sent_at.elapsed());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

/// Wait for the given attempt; past the end of the table the last entry repeats.
fn step(table: &[u64], attempt: u32, fallback: u64) -> u64 {
    table
        .get(attempt as usize)
        .or(table.last())
        .copied()
        .unwrap_or(fallback)
}

/// Settings for [`PoliteClient`]. Unset values fall back to the defaults above.
#[derive(Debug)]
pub struct PoliteClientBuilder {
    agent: String,
    pause: RangeInclusive<f64>,
    timeout: Duration,
    attempts: u32,
    backoff: Vec<u64>,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            agent: DEFAULT_USER_AGENT.to_string(),
            pause: 1.0..=3.0,
            timeout: Duration::from_secs(30),
            attempts: ATTEMPTS,
            backoff: BACKOFF_SECS.to_vec(),
        }
    }
}

impl PoliteClientBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.agent = ua.into();
        self
    }

    /// Random delay range between requests, in seconds. Bounds are swapped if reversed.
    pub fn delay_secs(mut self, min: f64, max: f64) -> Self {
        self.pause = min.min(max)..=min.max(max);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Number of attempts for transient failures (at least 1).
    pub fn retry_count(mut self, n: u32) -> Self {
        self.attempts = n.max(1);
        self
    }

    /// Backoff before each retry. Empty means doubling from one second.
    pub fn retry_backoff_secs(mut self, secs: Vec<u64>) -> Self {
        self.backoff = secs;
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML_AND_IMAGES));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_CHINESE_FIRST));
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(self.agent)
            .default_headers(headers)
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let backoff = if self.backoff.is_empty() {
            (1..self.attempts).map(|i| 1u64 << (i - 1).min(4)).collect()
        } else {
            self.backoff
        };
        Ok(PoliteClient {
            http,
            pause: self.pause,
            sent_at: None,
            attempts: self.attempts,
            backoff,
        })
    }
}
