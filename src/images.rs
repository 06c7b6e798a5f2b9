//! Image usage analysis: which files under `assets/images` no HTML page references, and a
//! backup-then-delete cleaner for them.

use regex::RegexBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];

/// Images referenced only from scripts or stylesheets, which the HTML scan cannot see.
pub fn default_known_used() -> Vec<String> {
    [
        "magic_ball.jpg",
        "erythrocytes__020.jpg",
        "罗小黑战记/角色/罗小黑战记 角色_001.webp",
        "罗小黑战记/角色/罗小黑战记 角色_003.webp",
        "罗小黑战记/角色/罗小黑战记 角色_005.webp",
        "罗小黑战记/角色/罗小黑战记 角色_007.webp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Images directory not found: {0}")]
    MissingImagesDir(PathBuf),

    #[error("Cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create backup directory {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files under `dir` (recursive) accepted by `keep`. Unreadable subdirectories are logged and
/// skipped; symlinked directories are not followed.
pub(crate) fn walk_files(
    dir: &Path,
    keep: &dyn Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, ImageError> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = match std::fs::read_dir(&current) {
            Ok(e) => e,
            Err(source) if current == dir => {
                return Err(ImageError::ReadDir {
                    path: current,
                    source,
                })
            }
            Err(e) => {
                warn!("Skipping {}: {}", current.display(), e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                stack.push(path);
            } else if kind.is_symlink() && path.is_dir() {
                debug!("Not following directory link {}", path.display());
            } else if keep(&path) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Reduce a `src` value to a path relative to the images directory, if it points into one.
pub fn image_reference(src: &str) -> Option<String> {
    let idx = src.rfind("images/")?;
    let rest = &src[idx + "images/".len()..];
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Every image path referenced by a `src` attribute in any `*.html` file under `root`.
pub fn scan_references(root: &Path) -> Result<BTreeSet<String>, ImageError> {
    let re = RegexBuilder::new(r#"src=["'](.*?)["']"#)
        .case_insensitive(true)
        .build()
        .expect("static regex");
    let files = walk_files(root, &|p| has_extension(p, &["html"]))?;
    let mut found = BTreeSet::new();
    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(e) => {
                warn!("Cannot read {}: {}", file.display(), e);
                continue;
            }
        };
        for caps in re.captures_iter(&content) {
            if let Some(r) = image_reference(&caps[1]) {
                found.insert(r);
            }
        }
    }
    info!(
        "Found {} referenced images in {} HTML files",
        found.len(),
        files.len()
    );
    Ok(found)
}

/// Image files under `images_dir` as `/`-separated relative paths, sorted.
pub fn list_images(images_dir: &Path) -> Result<Vec<String>, ImageError> {
    if !images_dir.is_dir() {
        return Err(ImageError::MissingImagesDir(images_dir.to_path_buf()));
    }
    let files = walk_files(images_dir, &|p| has_extension(p, &IMAGE_EXTENSIONS))?;
    let mut rel: Vec<String> = files
        .iter()
        .filter_map(|p| p.strip_prefix(images_dir).ok())
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    rel.sort();
    Ok(rel)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedImage {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct UsageReport {
    pub total_images: usize,
    /// References found in HTML plus the configured known-used list.
    pub used: BTreeSet<String>,
    pub unused: Vec<UnusedImage>,
    pub unused_bytes: u64,
}

/// Compare images on disk against references found under `root` and the known-used list.
pub fn analyze(
    root: &Path,
    images_dir: &Path,
    known_used: &[String],
) -> Result<UsageReport, ImageError> {
    let mut used = scan_references(root)?;
    used.extend(known_used.iter().cloned());
    let all = list_images(images_dir)?;
    let mut report = UsageReport {
        total_images: all.len(),
        ..Default::default()
    };
    for img in all {
        if used.contains(&img) {
            continue;
        }
        let size = std::fs::metadata(images_dir.join(&img))
            .map(|m| m.len())
            .unwrap_or(0);
        report.unused_bytes += size;
        report.unused.push(UnusedImage { path: img, size });
    }
    report.used = used;
    Ok(report)
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}

#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub backup_dir: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
    pub removed_dirs: usize,
}

/// Copy unused images to `backup_root/backup_{timestamp}/`, keeping their relative layout,
/// and delete the originals when `delete` is set. Per-file failures are counted.
pub fn backup_and_clean(
    report: &UsageReport,
    images_dir: &Path,
    backup_root: &Path,
    delete: bool,
) -> Result<CleanOutcome, ImageError> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup_dir = backup_root.join(format!("backup_{}", stamp));
    std::fs::create_dir_all(&backup_dir).map_err(|source| ImageError::Backup {
        path: backup_dir.clone(),
        source,
    })?;
    info!("Backing up to {}", backup_dir.display());

    let mut outcome = CleanOutcome {
        backup_dir: backup_dir.clone(),
        ..Default::default()
    };
    for img in &report.unused {
        let src = images_dir.join(&img.path);
        let dst = backup_dir.join(&img.path);
        let result = dst
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::copy(&src, &dst))
            .and_then(|_| {
                if delete {
                    std::fs::remove_file(&src)
                } else {
                    Ok(())
                }
            });
        match result {
            Ok(()) => {
                debug!("Backed up {}", img.path);
                outcome.succeeded += 1;
            }
            Err(e) => {
                error!("Failed to process {}: {}", img.path, e);
                outcome.failed += 1;
            }
        }
    }
    if delete {
        outcome.removed_dirs = remove_empty_dirs(images_dir);
    }
    Ok(outcome)
}

/// Remove empty directories below `root` (deepest first). `root` itself is kept.
pub fn remove_empty_dirs(root: &Path) -> usize {
    fn visit(dir: &Path, is_root: bool) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                removed += visit(&path, false);
            }
        }
        if !is_root {
            let empty = std::fs::read_dir(dir).is_ok_and(|mut d| d.next().is_none());
            if empty && std::fs::remove_dir(dir).is_ok() {
                info!("Removed empty directory {}", dir.display());
                removed += 1;
            }
        }
        removed
    }
    visit(root, true)
}
