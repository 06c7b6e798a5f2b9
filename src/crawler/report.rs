//! `download_report.json`: what a crawl left on disk, per category folder.

use super::CrawlerError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "download_report.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub total: usize,
    pub jpg: usize,
    pub png: usize,
    pub gif: usize,
    pub webp: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub total_downloaded: usize,
    pub generated_at: String,
    pub categories: BTreeMap<String, CategoryStats>,
    pub category_names: Vec<String>,
}

/// Count image files by extension in one folder (not recursive).
pub fn count_dir(dir: &Path) -> CategoryStats {
    let mut stats = CategoryStats::default();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return stats;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" => stats.jpg += 1,
            "png" => stats.png += 1,
            "gif" => stats.gif += 1,
            "webp" => stats.webp += 1,
            _ => continue,
        }
        stats.total += 1;
    }
    stats
}

impl DownloadReport {
    /// Scan every subfolder of `profile_dir`.
    pub fn build(profile_dir: &Path, total_downloaded: usize, category_names: Vec<String>) -> Self {
        let mut categories = BTreeMap::new();
        if let Ok(entries) = std::fs::read_dir(profile_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    categories.insert(name, count_dir(&path));
                }
            }
        }
        Self {
            total_downloaded,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            categories,
            category_names,
        }
    }

    pub fn write(&self, profile_dir: &Path) -> Result<PathBuf, CrawlerError> {
        let path = profile_dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| CrawlerError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_by_extension() {
        let dir = std::env::temp_dir().join(format!("bookpress_report_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let birds = dir.join("鸟类");
        std::fs::create_dir_all(&birds).unwrap();
        std::fs::create_dir_all(dir.join("空")).unwrap();
        for f in ["a.jpg", "b.JPG", "c.png", "d.gif", "e.webp", "f.txt", "g.jpeg"] {
            std::fs::write(birds.join(f), b"x").unwrap();
        }
        let report = DownloadReport::build(&dir, 5, vec!["鸟类".to_string(), "空".to_string()]);
        assert_eq!(
            report.categories["鸟类"],
            CategoryStats {
                total: 5,
                jpg: 2,
                png: 1,
                gif: 1,
                webp: 1
            }
        );
        assert_eq!(report.categories["空"].total, 0);

        let path = report.write(&dir).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["total_downloaded"], 5);
        assert_eq!(v["categories"]["鸟类"]["gif"], 1);
        assert_eq!(v["category_names"][1], "空");
        std::fs::remove_dir_all(&dir).ok();
    }
}
