//! The crawl loop: search each keyword, sort hits into category folders, download until the caps are hit.

use super::report::DownloadReport;
use super::{search_images, CategoryProfile, CrawlerError, ImageHit, PoliteClient, SearchEngine};
use anyhow::{bail, Context};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Downloaded {
    Saved { path: PathBuf, bytes: usize },
    /// A file with the same name was already there; nothing was written.
    Existing(PathBuf),
}

/// Search and download seam; the HTTP implementation is [`HttpBackend`].
pub trait CrawlBackend {
    fn search(&mut self, engine: SearchEngine, keyword: &str, pages: u32, gif: bool)
        -> Vec<ImageHit>;

    /// Download `url` to `stem` plus an extension chosen from the URL or content type.
    fn download(&mut self, url: &str, stem: &Path) -> anyhow::Result<Downloaded>;
}

pub struct HttpBackend {
    client: PoliteClient,
}

impl HttpBackend {
    pub fn new(client: PoliteClient) -> Self {
        Self { client }
    }
}

/// Extension (with dot) from the URL path, else from the content type, else `.jpg`.
pub fn image_extension(url: &str, content_type: &str) -> &'static str {
    const KNOWN: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default();
    if let Some(ext) = KNOWN.iter().copied().find(|e| path.ends_with(e)) {
        return ext;
    }
    let ct = content_type.to_lowercase();
    if ct.contains("jpeg") {
        ".jpg"
    } else if ct.contains("png") {
        ".png"
    } else if ct.contains("gif") {
        ".gif"
    } else if ct.contains("webp") {
        ".webp"
    } else {
        ".jpg"
    }
}

fn append_ext(stem: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = stem.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}

/// Where a fetched image goes, decided before its body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPlan {
    Write(PathBuf),
    /// Already on disk; counts as downloaded without writing.
    Existing(PathBuf),
}

/// Reject non-image content types, then name the file `stem` plus an extension from the URL
/// or content type.
pub fn plan_download(stem: &Path, url: &str, content_type: &str) -> anyhow::Result<DownloadPlan> {
    let content_type = content_type.to_lowercase();
    if !content_type.contains("image") {
        bail!("not an image ({}): {}", content_type, url);
    }
    let path = append_ext(stem, image_extension(url, &content_type));
    if path.exists() {
        Ok(DownloadPlan::Existing(path))
    } else {
        Ok(DownloadPlan::Write(path))
    }
}

/// Carry out a plan; `body` is only read when something must be written.
pub fn save_download(
    plan: DownloadPlan,
    body: impl FnOnce() -> anyhow::Result<Vec<u8>>,
) -> anyhow::Result<Downloaded> {
    match plan {
        DownloadPlan::Existing(path) => Ok(Downloaded::Existing(path)),
        DownloadPlan::Write(path) => {
            let bytes = body()?;
            std::fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
            Ok(Downloaded::Saved {
                path,
                bytes: bytes.len(),
            })
        }
    }
}

impl CrawlBackend for HttpBackend {
    fn search(
        &mut self,
        engine: SearchEngine,
        keyword: &str,
        pages: u32,
        gif: bool,
    ) -> Vec<ImageHit> {
        search_images(engine, &mut self.client, keyword, pages, gif)
    }

    fn download(&mut self, url: &str, stem: &Path) -> anyhow::Result<Downloaded> {
        let response = self
            .client
            .get_with_retry(url)
            .with_context(|| format!("request failed: {}", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} for {}", status.as_u16(), url);
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let plan = plan_download(stem, url, &content_type)?;
        save_download(plan, || {
            Ok(response.bytes().context("reading image body")?.to_vec())
        })
    }
}

/// Run settings, starting from the profile and overridable from the command line.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub engines: Vec<SearchEngine>,
    pub max_per_category: usize,
    pub max_total: usize,
    pub pages: u32,
    /// Parent of the profile folder.
    pub images_dir: PathBuf,
}

impl CrawlOptions {
    pub fn from_profile(profile: &CategoryProfile, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            engines: profile.engines.clone(),
            max_per_category: profile.max_per_category,
            max_total: profile.max_total,
            pages: profile.pages,
            images_dir: images_dir.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub total: usize,
    pub failed: usize,
    pub counts: BTreeMap<String, usize>,
    pub profile_dir: PathBuf,
    pub report_path: PathBuf,
}

/// Crawl every keyword of `profile`. Download failures are logged and skipped; stops at
/// `max_total` or when every category is full, then writes the download report.
pub fn run_crawl(
    backend: &mut dyn CrawlBackend,
    profile: &CategoryProfile,
    opts: &CrawlOptions,
    progress: Option<&dyn Fn(u32, u32)>,
) -> Result<CrawlSummary, CrawlerError> {
    let profile_dir = opts.images_dir.join(&profile.dir_name);
    let names = profile.category_names();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in &names {
        let dir = profile_dir.join(name);
        std::fs::create_dir_all(&dir).map_err(|source| CrawlerError::Io {
            path: dir.clone(),
            source,
        })?;
        debug!("Category folder {}", dir.display());
        counts.insert(name.clone(), 0);
    }

    let keywords = profile.run_keywords();
    let total_keywords = keywords.len() as u32;
    let mut total = 0usize;
    let mut failed = 0usize;
    info!(
        "Crawling '{}': {} keywords, up to {} per category, {} total",
        profile.dir_name,
        keywords.len(),
        opts.max_per_category,
        opts.max_total
    );

    'keywords: for (i, keyword) in keywords.iter().enumerate() {
        if let Some(cb) = progress {
            cb(i as u32 + 1, total_keywords);
        }
        if total >= opts.max_total {
            break;
        }
        info!("Searching: {}", keyword);
        let gif = profile.wants_gif(keyword);
        let mut hits: Vec<ImageHit> = opts
            .engines
            .iter()
            .flat_map(|&e| backend.search(e, keyword, opts.pages, gif))
            .collect();
        if let Some(n) = profile.hits_per_keyword {
            hits.truncate(n);
        }

        let clean = profile.clean_keyword(keyword);
        for hit in &hits {
            let category = profile.categorize(&hit.title, &hit.keyword).to_string();
            let count = counts.get(&category).copied().unwrap_or(0);
            if count >= opts.max_per_category {
                continue;
            }
            let stem = profile_dir
                .join(&category)
                .join(format!("{}_{:03}", clean, count + 1));
            match backend.download(&hit.url, &stem) {
                Ok(Downloaded::Saved { path, bytes }) => {
                    info!(
                        "Downloaded {} ({:.2} MB)",
                        path.display(),
                        bytes as f64 / (1024.0 * 1024.0)
                    );
                }
                Ok(Downloaded::Existing(path)) => {
                    info!("Already exists, skipping: {}", path.display());
                }
                Err(e) => {
                    warn!("Download failed {}: {:#}", hit.url, e);
                    failed += 1;
                    continue;
                }
            }
            total += 1;
            *counts.entry(category).or_insert(0) += 1;
            if total >= opts.max_total {
                info!("Reached {} images, stopping", opts.max_total);
                break 'keywords;
            }
        }

        if counts.values().all(|&c| c >= opts.max_per_category) {
            info!("Every category is full");
            break;
        }
    }

    info!("Crawl finished: {} images downloaded", total);
    let report = DownloadReport::build(&profile_dir, total, names);
    let report_path = report.write(&profile_dir)?;
    info!("Report saved to {}", report_path.display());
    Ok(CrawlSummary {
        total,
        failed,
        counts,
        profile_dir,
        report_path,
    })
}
