//! Housekeeping for the `output/` directory: rendered PDFs, staged temp files and logs.

use crate::images::{walk_files, ImageError};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_TEMP_DAYS: u64 = 7;
pub const DEFAULT_LOG_DAYS: u64 = 30;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No PDF files to back up in {0}")]
    NoPdfs(PathBuf),

    #[error(transparent)]
    Walk(#[from] ImageError),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Pdf,
    Temp,
    Logs,
}

impl CacheKind {
    pub const ALL: [CacheKind; 3] = [CacheKind::Pdf, CacheKind::Temp, CacheKind::Logs];

    pub fn label(self) -> &'static str {
        match self {
            CacheKind::Pdf => "pdf",
            CacheKind::Temp => "temp",
            CacheKind::Logs => "logs",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Relative to the kind's directory.
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct CacheManager {
    pub output_dir: PathBuf,
    pub pdf_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl CacheManager {
    /// Open the cache under `output_dir`, creating `pdf/`, `temp/` and `logs/`.
    pub fn open(output_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let output_dir = output_dir.into();
        let manager = Self {
            pdf_dir: output_dir.join("pdf"),
            temp_dir: output_dir.join("temp"),
            logs_dir: output_dir.join("logs"),
            output_dir,
        };
        for dir in [&manager.pdf_dir, &manager.temp_dir, &manager.logs_dir] {
            std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        }
        Ok(manager)
    }

    fn dir(&self, kind: CacheKind) -> &Path {
        match kind {
            CacheKind::Pdf => &self.pdf_dir,
            CacheKind::Temp => &self.temp_dir,
            CacheKind::Logs => &self.logs_dir,
        }
    }

    /// Files of one kind, sorted by name. PDFs and logs are top-level only; temp is recursive.
    pub fn list(&self, kind: CacheKind) -> Result<Vec<CacheEntry>, CacheError> {
        let dir = self.dir(kind);
        let files = match kind {
            CacheKind::Pdf => top_level(dir, "pdf")?,
            CacheKind::Logs => top_level(dir, "log")?,
            CacheKind::Temp => walk_files(dir, &|_| true)?,
        };
        let mut entries = Vec::with_capacity(files.len());
        for f in files {
            let meta = std::fs::metadata(&f).map_err(io_err(&f))?;
            let modified = meta.modified().map_err(io_err(&f))?;
            let name = f
                .strip_prefix(dir)
                .unwrap_or(&f)
                .to_string_lossy()
                .into_owned();
            entries.push(CacheEntry {
                name,
                size: meta.len(),
                modified: DateTime::<Local>::from(modified),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Delete temp files (recursive) older than `days`.
    pub fn clean_temp(&self, days: u64) -> Result<usize, CacheError> {
        let files = walk_files(&self.temp_dir, &|_| true)?;
        remove_older_than(files, days)
    }

    /// Delete `*.log` files older than `days`.
    pub fn clean_logs(&self, days: u64) -> Result<usize, CacheError> {
        remove_older_than(top_level(&self.logs_dir, "log")?, days)
    }

    /// Copy every PDF into `dest/backup_{timestamp}/`. Returns that folder.
    pub fn backup_pdfs(&self, dest: &Path) -> Result<(PathBuf, usize), CacheError> {
        let pdfs = top_level(&self.pdf_dir, "pdf")?;
        if pdfs.is_empty() {
            return Err(CacheError::NoPdfs(self.pdf_dir.clone()));
        }
        let folder = dest.join(format!("backup_{}", Local::now().format("%Y%m%d_%H%M%S")));
        std::fs::create_dir_all(&folder).map_err(io_err(&folder))?;
        for pdf in &pdfs {
            if let Some(name) = pdf.file_name() {
                let target = folder.join(name);
                std::fs::copy(pdf, &target).map_err(io_err(&target))?;
                info!("Backed up {}", pdf.display());
            }
        }
        Ok((folder, pdfs.len()))
    }

    /// Bytes used by every file under `output/`.
    pub fn total_size(&self) -> Result<u64, CacheError> {
        let files = walk_files(&self.output_dir, &|_| true)?;
        Ok(files
            .iter()
            .filter_map(|f| std::fs::metadata(f).ok())
            .map(|m| m.len())
            .sum())
    }
}

fn top_level(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, CacheError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err(dir))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

const SECS_PER_DAY: u64 = 86_400;

/// Oldest modification time to keep. Windows reaching before the epoch keep everything.
fn cutoff_for(days: u64) -> SystemTime {
    SystemTime::now()
        .checked_sub(Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn remove_older_than(files: Vec<PathBuf>, days: u64) -> Result<usize, CacheError> {
    let cutoff = cutoff_for(days);
    let mut removed = 0;
    for f in files {
        let modified = std::fs::metadata(&f)
            .and_then(|m| m.modified())
            .map_err(io_err(&f))?;
        if modified < cutoff {
            std::fs::remove_file(&f).map_err(io_err(&f))?;
            info!("Removed {}", f.display());
            removed += 1;
        }
    }
    Ok(removed)
}
