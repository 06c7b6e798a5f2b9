//! CLI parsing and orchestration. One subcommand per tool; maps errors to exit codes.

use crate::assemble::{write_print_version, AssembleError};
use crate::cache::{CacheError, CacheKind, CacheManager, DEFAULT_LOG_DAYS, DEFAULT_TEMP_DAYS};
use crate::config::{self, Config};
use crate::crawler::{
    builtin_profile, run_crawl, CategoryProfile, CrawlOptions, CrawlerError, HttpBackend,
    PoliteClient, SearchEngine, BUILTIN_PROFILES,
};
use crate::export::{
    export_book_pdf, export_chapters, export_covers, export_professional_pdf, ChapterMode,
    CoverMode, CoverSide, ExportError, PageFormat,
};
use crate::images::{analyze, backup_and_clean, default_known_used, format_size, ImageError};
use crate::logging;
use crate::model::{BookLayout, LayoutError, ProjectPaths};
use crate::pronounce::{add_pronunciation_to_chapters, PronounceOutcome};
use crate::render::{default_args, CommandRenderer, RenderError, DEFAULT_PROGRAM};
use crate::split::{run_split, SplitError};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Layout(#[from] LayoutError),

    #[error("{0}")]
    Split(#[from] SplitError),

    #[error("{0}")]
    Assemble(#[from] AssembleError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Image(#[from] ImageError),

    #[error("{0}")]
    Crawler(#[from] CrawlerError),

    #[error("{0}")]
    Cache(#[from] CacheError),

    /// The run finished but some items failed; they were logged individually.
    #[error("{0}")]
    Incomplete(String),

    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_)
            | CliRunError::Config(_)
            | CliRunError::Layout(_)
            | CliRunError::Split(SplitError::Layout(_))
            | CliRunError::Export(ExportError::MissingInputs { .. })
            | CliRunError::Image(ImageError::MissingImagesDir(_))
            | CliRunError::Crawler(
                CrawlerError::UnknownProfile { .. }
                | CrawlerError::ProfileFile { .. }
                | CrawlerError::InvalidProfile(_),
            ) => 1,
            CliRunError::Crawler(CrawlerError::Io { .. }) => 3,
            CliRunError::Crawler(_) => 2,
            CliRunError::Split(_)
            | CliRunError::Assemble(_)
            | CliRunError::Export(_)
            | CliRunError::Render(_)
            | CliRunError::Image(_)
            | CliRunError::Cache(_)
            | CliRunError::Incomplete(_)
            | CliRunError::Io { .. } => 3,
        }
    }

    /// Lines printed to stderr on failure. Verbose runs add the cause chain; runs that
    /// failed partway point at the log for the individual failures.
    pub fn report(&self, verbose: bool) -> Vec<String> {
        let mut lines = vec![format!("bookpress: {}", self)];
        if verbose {
            let mut source = std::error::Error::source(self);
            while let Some(s) = source {
                lines.push(format!("  caused by: {}", s));
                source = s.source();
            }
        }
        if matches!(self, CliRunError::Incomplete(_)) {
            lines.push("  see the warnings above (or the log file) for each failed item".to_string());
        }
        lines
    }
}

#[derive(Parser, Debug)]
#[command(name = "bookpress")]
#[command(about = "Split, assemble and export an illustrated e-book; prune its images; crawl reference pictures")]
#[command(
    after_help = "Config file keys (project_dir, [book], [images], [render], [crawler]) are read from ./bookpress.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    /// Project root holding the manuscript, chapters/, assets/images/ and output/ (overrides config; default .).
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging and the full error chain on failure.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also append log lines to this file. `crawl` defaults to output/logs/crawler.log.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split the manuscript into chapters/chapterNN.html, appendix.html and index.html.
    Split,

    /// Merge covers, contents, chapters and appendix into output/{title}-print.html.
    Print,

    /// Render the whole book to PDF.
    Pdf {
        /// Professional trim-size edition (no blank pages, running header, page numbers).
        #[arg(long)]
        professional: bool,
    },

    /// Export each chapter on its own.
    Chapters {
        /// Page size: 16k, 32k, a5 or a4.
        #[arg(long, default_value = "16k", value_parser = parse_page_format)]
        format: PageFormat,

        /// pdf, browser (print-ready HTML) or both.
        #[arg(long, default_value = "both", value_parser = parse_chapter_mode)]
        mode: ChapterMode,
    },

    /// Render the covers on their own.
    Cover {
        /// front, back or both.
        #[arg(default_value = "both", value_parser = parse_cover_target)]
        target: CoverTarget,

        /// a4 (centred on A4), professional (raw trim) or both.
        #[arg(long, default_value = "both", value_parser = parse_cover_modes)]
        mode: CoverModes,
    },

    /// Find images no page references; optionally back them up and delete them.
    Images {
        /// report (default), backup, or clean (backup then delete).
        #[arg(default_value = "report", value_parser = parse_image_action)]
        action: ImageAction,

        /// Backup root (default: cache/unused_images_backup under the project).
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// Make word cards in every chapter clickable for pronunciation.
    Pronounce,

    /// Download reference images for a category profile.
    Crawl {
        /// Built-in profile: animals, cells, human-body or luoxiaohei.
        profile: Option<String>,

        /// Custom profile from a TOML file (instead of a built-in name).
        #[arg(long, conflicts_with = "profile")]
        profile_file: Option<PathBuf>,

        /// Use only this engine: baidu, bing or unsplash.
        #[arg(long, value_parser = parse_engine)]
        engine: Option<SearchEngine>,

        #[arg(long)]
        max_per_category: Option<usize>,

        #[arg(long)]
        max_total: Option<usize>,

        /// Result pages per keyword and engine.
        #[arg(long)]
        pages: Option<u32>,

        /// Parent directory for the profile folder (default: assets/images).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Inspect and tidy output/.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached files.
    List {
        /// pdf, temp or logs (default: all).
        #[arg(long, value_parser = parse_cache_kind)]
        kind: Option<CacheKind>,
    },
    /// Remove old temp files (default 7 days) and logs (default 30 days).
    Clean {
        /// Age cutoff in days for both temp files and logs.
        #[arg(long)]
        days: Option<u64>,
    },
    /// Copy output/pdf/*.pdf into a timestamped backup folder.
    Backup {
        /// Destination (default: ~/Documents/bookpress_pdf_backup).
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Total size of output/.
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverTarget {
    Front,
    Back,
    Both,
}

impl CoverTarget {
    fn sides(self) -> &'static [CoverSide] {
        match self {
            CoverTarget::Front => &[CoverSide::Front],
            CoverTarget::Back => &[CoverSide::Back],
            CoverTarget::Both => &[CoverSide::Front, CoverSide::Back],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverModes {
    A4,
    Professional,
    Both,
}

impl CoverModes {
    fn modes(self) -> &'static [CoverMode] {
        match self {
            CoverModes::A4 => &[CoverMode::A4],
            CoverModes::Professional => &[CoverMode::Professional],
            CoverModes::Both => &[CoverMode::A4, CoverMode::Professional],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAction {
    Report,
    Backup,
    Clean,
}

fn parse_page_format(s: &str) -> Result<PageFormat, String> {
    match s.to_lowercase().as_str() {
        "16k" | "16开" => Ok(PageFormat::Kai16),
        "32k" | "大32开" => Ok(PageFormat::Kai32),
        "a5" => Ok(PageFormat::A5),
        "a4" => Ok(PageFormat::A4),
        _ => Err(format!(
            "Invalid --format value: '{}'. Use 16k, 32k, a5, or a4.",
            s
        )),
    }
}

fn parse_chapter_mode(s: &str) -> Result<ChapterMode, String> {
    match s.to_lowercase().as_str() {
        "pdf" => Ok(ChapterMode::Pdf),
        "browser" | "html" => Ok(ChapterMode::Browser),
        "both" => Ok(ChapterMode::Both),
        _ => Err(format!(
            "Invalid --mode value: '{}'. Use pdf, browser, or both.",
            s
        )),
    }
}

fn parse_cover_target(s: &str) -> Result<CoverTarget, String> {
    match s.to_lowercase().as_str() {
        "front" => Ok(CoverTarget::Front),
        "back" => Ok(CoverTarget::Back),
        "both" => Ok(CoverTarget::Both),
        _ => Err(format!(
            "Invalid cover: '{}'. Use front, back, or both.",
            s
        )),
    }
}

fn parse_cover_modes(s: &str) -> Result<CoverModes, String> {
    match s.to_lowercase().as_str() {
        "a4" => Ok(CoverModes::A4),
        "professional" | "pro" => Ok(CoverModes::Professional),
        "both" => Ok(CoverModes::Both),
        _ => Err(format!(
            "Invalid --mode value: '{}'. Use a4, professional, or both.",
            s
        )),
    }
}

fn parse_image_action(s: &str) -> Result<ImageAction, String> {
    match s.to_lowercase().as_str() {
        "report" => Ok(ImageAction::Report),
        "backup" => Ok(ImageAction::Backup),
        "clean" => Ok(ImageAction::Clean),
        _ => Err(format!(
            "Invalid images action: '{}'. Use report, backup, or clean.",
            s
        )),
    }
}

fn parse_engine(s: &str) -> Result<SearchEngine, String> {
    match s.to_lowercase().as_str() {
        "baidu" => Ok(SearchEngine::Baidu),
        "bing" => Ok(SearchEngine::Bing),
        "unsplash" => Ok(SearchEngine::Unsplash),
        _ => Err(format!(
            "Invalid --engine value: '{}'. Use baidu, bing, or unsplash.",
            s
        )),
    }
}

fn parse_cache_kind(s: &str) -> Result<CacheKind, String> {
    match s.to_lowercase().as_str() {
        "pdf" => Ok(CacheKind::Pdf),
        "temp" | "tmp" => Ok(CacheKind::Temp),
        "logs" | "log" => Ok(CacheKind::Logs),
        _ => Err(format!(
            "Invalid --kind value: '{}'. Use pdf, temp, or logs.",
            s
        )),
    }
}

/// Project root: --project, then config `project_dir`, then the current directory.
fn resolve_project_root(args: &Args, config: Option<&Config>) -> PathBuf {
    args.project
        .clone()
        .or_else(|| config.and_then(|c| c.project_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn effective_log_file(args: &Args, paths: &ProjectPaths) -> Option<PathBuf> {
    match (&args.log_file, &args.command) {
        (Some(p), _) => Some(p.clone()),
        (None, Command::Crawl { .. }) => Some(paths.output_dir.join("logs").join("crawler.log")),
        (None, _) => None,
    }
}

fn layout_from(config: Option<&Config>) -> Result<BookLayout, CliRunError> {
    let layout = config
        .and_then(|c| c.book.clone())
        .unwrap_or_default();
    layout.validate()?;
    Ok(layout)
}

fn renderer_from(config: Option<&Config>, paths: &ProjectPaths) -> CommandRenderer {
    let program = config
        .and_then(|c| c.render.program.clone())
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
    let args = config
        .and_then(|c| c.render.args.clone())
        .unwrap_or_else(default_args);
    CommandRenderer::new(program, args, paths.output_dir.join("temp"))
}

fn client_from(config: Option<&Config>) -> Result<PoliteClient, CliRunError> {
    let c = config.map(|c| &c.crawler);
    let mut builder = PoliteClient::builder();
    if let Some(ua) = c.and_then(|c| c.user_agent.clone()) {
        builder = builder.user_agent(ua);
    }
    if let Some(secs) = c.and_then(|c| c.timeout_secs) {
        builder = builder.timeout_secs(secs);
    }
    let min = c.and_then(|c| c.delay_min_secs);
    let max = c.and_then(|c| c.delay_max_secs);
    if min.is_some() || max.is_some() {
        let min = min.unwrap_or(1.0);
        builder = builder.delay_secs(min, max.unwrap_or(min.max(3.0)));
    }
    if let Some(n) = c.and_then(|c| c.retry_count) {
        builder = builder.retry_count(n);
    }
    if let Some(b) = c.and_then(|c| c.retry_backoff_secs.clone()) {
        builder = builder.retry_backoff_secs(b);
    }
    builder
        .build()
        .map_err(|e| CliRunError::Crawler(CrawlerError::Client(e)))
}

/// Lazily created indicatif bar driven by `(n, total)` callbacks.
struct Progress {
    bar: RefCell<Option<indicatif::ProgressBar>>,
    noun: &'static str,
}

impl Progress {
    fn new(noun: &'static str) -> Self {
        Self {
            bar: RefCell::new(None),
            noun,
        }
    }

    fn update(&self, n: u32, total: u32) {
        if total == 0 {
            return;
        }
        let mut state = self.bar.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
            {
                bar.set_style(
                    style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .progress_chars("█▉▊▋▌▍▎▏ "),
                );
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(n as u64);
        pb.set_message(format!("{} {}/{}", self.noun, n, total));
    }

    fn finish(&self) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.disable_steady_tick();
            pb.finish_and_clear();
        }
    }
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::Config)?;
    let config = config.as_ref();
    let paths = ProjectPaths::new(resolve_project_root(args, config));

    let log_file = effective_log_file(args, &paths);
    logging::init(args.verbose, args.quiet, log_file.as_deref()).map_err(|source| {
        CliRunError::Io {
            path: log_file.clone().unwrap_or_default(),
            source,
        }
    })?;

    match &args.command {
        Command::Split => {
            let layout = layout_from(config)?;
            let written = run_split(&paths, &layout)?;
            if !args.quiet {
                eprintln!("Wrote {} files to {}", written.len(), paths.chapters_dir.display());
            }
        }
        Command::Print => {
            let layout = layout_from(config)?;
            let (path, edition) = write_print_version(&paths, &layout)?;
            for part in &edition.skipped {
                warn!("Skipped missing {}", part.label());
            }
            if !args.quiet {
                eprintln!(
                    "Wrote {} ({} parts). Open it in a browser and print to PDF.",
                    path.display(),
                    edition.included.len()
                );
            }
        }
        Command::Pdf { professional } => {
            let layout = layout_from(config)?;
            let renderer = renderer_from(config, &paths);
            let out = if *professional {
                export_professional_pdf(&paths, &layout, &renderer)?
            } else {
                export_book_pdf(&paths, &layout, &renderer)?
            };
            if !args.quiet {
                eprintln!("Wrote {}", out.display());
            }
        }
        Command::Chapters { format, mode } => {
            let layout = layout_from(config)?;
            let renderer = renderer_from(config, &paths);
            let bar = Progress::new("Exporting chapter");
            let cb = |n: u32, total: u32| bar.update(n, total);
            let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&cb) };
            let summary = export_chapters(&paths, &layout, *format, *mode, &renderer, progress)?;
            bar.finish();
            if !args.quiet {
                eprintln!(
                    "{} PDF, {} browser pages written under {}",
                    summary.pdfs.len(),
                    summary.browser_pages.len(),
                    paths.output_dir.join("chapters_pdf").display()
                );
            }
            if !summary.failed.is_empty() {
                let labels: Vec<&str> = summary.failed.iter().map(|(l, _)| l.as_str()).collect();
                return Err(CliRunError::Incomplete(format!(
                    "{} of {} chapters failed: {}",
                    labels.len(),
                    summary.total,
                    labels.join(", ")
                )));
            }
        }
        Command::Cover { target, mode } => {
            let renderer = renderer_from(config, &paths);
            let summary = export_covers(&paths, target.sides(), mode.modes(), &renderer);
            if !args.quiet {
                for path in &summary.written {
                    eprintln!("Wrote {}", path.display());
                }
            }
            if !summary.failed.is_empty() {
                let names: Vec<&str> = summary.failed.iter().map(|(n, _)| n.as_str()).collect();
                return Err(CliRunError::Incomplete(format!(
                    "Cover export failed: {}",
                    names.join(", ")
                )));
            }
        }
        Command::Images { action, backup_dir } => {
            run_images(args, config, &paths, *action, backup_dir.as_deref())?
        }
        Command::Pronounce => {
            let results = add_pronunciation_to_chapters(&paths.chapters_dir).map_err(|source| {
                CliRunError::Io {
                    path: paths.chapters_dir.clone(),
                    source,
                }
            })?;
            let count = |want: fn(&PronounceOutcome) -> bool| {
                results.iter().filter(|(_, o)| want(o)).count()
            };
            let added = count(|o| matches!(o, PronounceOutcome::Added));
            let present = count(|o| matches!(o, PronounceOutcome::AlreadyPresent));
            let failed = count(|o| matches!(o, PronounceOutcome::Failed(_)));
            if !args.quiet {
                eprintln!(
                    "Pronunciation: {} updated, {} already present, {} failed",
                    added, present, failed
                );
            }
            if failed > 0 {
                return Err(CliRunError::Incomplete(format!(
                    "{} chapter files could not be updated",
                    failed
                )));
            }
        }
        Command::Crawl {
            profile,
            profile_file,
            engine,
            max_per_category,
            max_total,
            pages,
            out,
        } => {
            let profile = match (profile, profile_file) {
                (_, Some(path)) => CategoryProfile::from_toml_file(path)?,
                (Some(name), None) => builtin_profile(name)?,
                (None, None) => {
                    return Err(CliRunError::InvalidInput(format!(
                        "Name a profile ({}) or pass --profile-file.",
                        BUILTIN_PROFILES.join(", ")
                    )))
                }
            };
            let mut opts = CrawlOptions::from_profile(
                &profile,
                out.clone().unwrap_or_else(|| paths.images_dir.clone()),
            );
            if let Some(e) = engine {
                opts.engines = vec![*e];
            }
            if let Some(n) = max_per_category {
                opts.max_per_category = *n;
            }
            if let Some(n) = max_total {
                opts.max_total = *n;
            }
            if let Some(n) = pages {
                opts.pages = (*n).max(1);
            }

            let mut backend = HttpBackend::new(client_from(config)?);
            let bar = Progress::new("Keyword");
            let cb = |n: u32, total: u32| bar.update(n, total);
            let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&cb) };
            let summary = run_crawl(&mut backend, &profile, &opts, progress)?;
            bar.finish();
            if !args.quiet {
                eprintln!(
                    "Downloaded {} images ({} failed) into {}",
                    summary.total,
                    summary.failed,
                    summary.profile_dir.display()
                );
                for (category, n) in &summary.counts {
                    eprintln!("  {}: {}", category, n);
                }
                eprintln!("Report: {}", summary.report_path.display());
            }
        }
        Command::Cache { action } => run_cache(args, &paths, action)?,
    }
    Ok(())
}

fn run_images(
    args: &Args,
    config: Option<&Config>,
    paths: &ProjectPaths,
    action: ImageAction,
    backup_dir: Option<&Path>,
) -> Result<(), CliRunError> {
    let known_used = config
        .and_then(|c| c.images.known_used.clone())
        .unwrap_or_else(default_known_used);
    let report = analyze(&paths.root, &paths.images_dir, &known_used)?;

    println!("Images on disk: {}", report.total_images);
    println!("Referenced:     {}", report.used.len());
    println!(
        "Unused:         {} ({})",
        report.unused.len(),
        format_size(report.unused_bytes)
    );
    for img in &report.unused {
        println!("  {}  {}", img.path, format_size(img.size));
    }

    if action == ImageAction::Report || report.unused.is_empty() {
        return Ok(());
    }
    let backup_root = backup_dir
        .map(|p| crate::model::resolve(&paths.root, p))
        .unwrap_or_else(|| paths.root.join("cache").join("unused_images_backup"));
    let delete = action == ImageAction::Clean;
    let outcome = backup_and_clean(&report, &paths.images_dir, &backup_root, delete)?;
    info!("Backup folder: {}", outcome.backup_dir.display());
    if !args.quiet {
        eprintln!(
            "{} {} images, {} failed; backup in {}",
            if delete { "Removed" } else { "Backed up" },
            outcome.succeeded,
            outcome.failed,
            outcome.backup_dir.display()
        );
        if delete {
            eprintln!("Removed {} empty directories", outcome.removed_dirs);
        }
    }
    if outcome.failed > 0 {
        return Err(CliRunError::Incomplete(format!(
            "{} images could not be processed",
            outcome.failed
        )));
    }
    Ok(())
}

fn run_cache(args: &Args, paths: &ProjectPaths, action: &CacheAction) -> Result<(), CliRunError> {
    let cache = CacheManager::open(&paths.output_dir)?;
    match action {
        CacheAction::List { kind } => {
            let kinds: Vec<CacheKind> = match kind {
                Some(k) => vec![*k],
                None => CacheKind::ALL.to_vec(),
            };
            for k in kinds {
                let entries = cache.list(k)?;
                println!("{} ({} files)", k.label(), entries.len());
                for e in entries {
                    println!(
                        "  {:<40} {:>10}  {}",
                        e.name,
                        format_size(e.size),
                        e.modified.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        CacheAction::Clean { days } => {
            let temp = cache.clean_temp(days.unwrap_or(DEFAULT_TEMP_DAYS))?;
            let logs = cache.clean_logs(days.unwrap_or(DEFAULT_LOG_DAYS))?;
            if !args.quiet {
                eprintln!("Removed {} temp files and {} log files", temp, logs);
            }
        }
        CacheAction::Backup { dest } => {
            let dest = match dest {
                Some(d) => d.clone(),
                None => dirs::document_dir()
                    .or_else(dirs::home_dir)
                    .map(|d| d.join("bookpress_pdf_backup"))
                    .ok_or_else(|| {
                        CliRunError::InvalidInput(
                            "No documents directory found; pass --dest.".to_string(),
                        )
                    })?,
            };
            let (folder, n) = cache.backup_pdfs(&dest)?;
            if !args.quiet {
                eprintln!("Backed up {} PDFs to {}", n, folder.display());
            }
        }
        CacheAction::Size => {
            println!("{}", format_size(cache.total_size()?));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(command: Command) -> Args {
        Args {
            project: None,
            quiet: true,
            verbose: false,
            log_file: None,
            command,
        }
    }

    #[test]
    fn parse_page_format_all() {
        assert_eq!(parse_page_format("16k").unwrap(), PageFormat::Kai16);
        assert_eq!(parse_page_format("32K").unwrap(), PageFormat::Kai32);
        assert_eq!(parse_page_format("A5").unwrap(), PageFormat::A5);
        assert_eq!(parse_page_format("a4").unwrap(), PageFormat::A4);
        assert!(parse_page_format("letter").is_err());
    }

    #[test]
    fn parse_chapter_mode_all() {
        assert_eq!(parse_chapter_mode("pdf").unwrap(), ChapterMode::Pdf);
        assert_eq!(parse_chapter_mode("browser").unwrap(), ChapterMode::Browser);
        assert_eq!(parse_chapter_mode("BOTH").unwrap(), ChapterMode::Both);
        assert!(parse_chapter_mode("epub").is_err());
    }

    #[test]
    fn cover_target_and_modes_expand() {
        assert_eq!(parse_cover_target("front").unwrap().sides(), &[CoverSide::Front]);
        assert_eq!(parse_cover_target("both").unwrap().sides().len(), 2);
        assert!(parse_cover_target("spine").is_err());
        assert_eq!(
            parse_cover_modes("pro").unwrap().modes(),
            &[CoverMode::Professional]
        );
        assert_eq!(parse_cover_modes("both").unwrap().modes().len(), 2);
        assert!(parse_cover_modes("a3").is_err());
    }

    #[test]
    fn parse_engine_and_kind() {
        assert_eq!(parse_engine("Bing").unwrap(), SearchEngine::Bing);
        assert_eq!(parse_engine("baidu").unwrap(), SearchEngine::Baidu);
        assert_eq!(parse_engine("unsplash").unwrap(), SearchEngine::Unsplash);
        assert!(parse_engine("duckduckgo").is_err());
        assert_eq!(parse_cache_kind("tmp").unwrap(), CacheKind::Temp);
        assert_eq!(parse_cache_kind("logs").unwrap(), CacheKind::Logs);
        assert!(parse_cache_kind("images").is_err());
        assert_eq!(parse_image_action("clean").unwrap(), ImageAction::Clean);
        assert!(parse_image_action("purge").is_err());
    }

    #[test]
    fn args_parse_subcommands() {
        let args = Args::try_parse_from([
            "bookpress", "--project", "book", "chapters", "--format", "a5", "--mode", "pdf",
        ])
        .unwrap();
        assert_eq!(args.project.as_deref(), Some(Path::new("book")));
        assert!(matches!(
            args.command,
            Command::Chapters {
                format: PageFormat::A5,
                mode: ChapterMode::Pdf
            }
        ));

        let args = Args::try_parse_from(["bookpress", "crawl", "cells", "--engine", "bing", "-q"])
            .unwrap();
        assert!(args.quiet);
        match args.command {
            Command::Crawl { profile, engine, .. } => {
                assert_eq!(profile.as_deref(), Some("cells"));
                assert_eq!(engine, Some(SearchEngine::Bing));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args = Args::try_parse_from(["bookpress", "cache", "clean", "--days", "3"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Cache {
                action: CacheAction::Clean { days: Some(3) }
            }
        ));

        let args = Args::try_parse_from(["bookpress", "cover"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Cover {
                target: CoverTarget::Both,
                mode: CoverModes::Both
            }
        ));
        assert!(Args::try_parse_from(["bookpress", "chapters", "--format", "b5"]).is_err());
    }

    #[test]
    fn project_root_precedence() {
        let mut args = args_for(Command::Split);
        let config = Config {
            project_dir: Some(PathBuf::from("from-config")),
            ..Default::default()
        };
        assert_eq!(resolve_project_root(&args, None), PathBuf::from("."));
        assert_eq!(
            resolve_project_root(&args, Some(&config)),
            PathBuf::from("from-config")
        );
        args.project = Some(PathBuf::from("from-flag"));
        assert_eq!(
            resolve_project_root(&args, Some(&config)),
            PathBuf::from("from-flag")
        );
    }

    #[test]
    fn crawl_logs_to_output_by_default() {
        let paths = ProjectPaths::new("proj");
        let crawl = args_for(Command::Crawl {
            profile: Some("animals".into()),
            profile_file: None,
            engine: None,
            max_per_category: None,
            max_total: None,
            pages: None,
            out: None,
        });
        assert_eq!(
            effective_log_file(&crawl, &paths),
            Some(PathBuf::from("proj/output/logs/crawler.log"))
        );
        assert_eq!(effective_log_file(&args_for(Command::Print), &paths), None);
        let mut explicit = args_for(Command::Print);
        explicit.log_file = Some(PathBuf::from("x.log"));
        assert_eq!(
            effective_log_file(&explicit, &paths),
            Some(PathBuf::from("x.log"))
        );
    }

    #[test]
    fn layout_falls_back_to_default() {
        let layout = layout_from(None).unwrap();
        assert_eq!(layout.chapters.len(), 11);
    }

    #[test]
    fn report_adds_causes_only_when_verbose() {
        let err = CliRunError::Io {
            path: PathBuf::from("out/book.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let quiet = err.report(false);
        assert_eq!(quiet, vec!["bookpress: Cannot access out/book.pdf: denied".to_string()]);
        let verbose = err.report(true);
        assert_eq!(verbose.len(), 2);
        assert_eq!(verbose[1], "  caused by: denied");

        let partial = CliRunError::Incomplete("2 chapters failed".into()).report(false);
        assert_eq!(partial[0], "bookpress: 2 chapters failed");
        assert!(partial[1].contains("failed item"));
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(CliRunError::Config("bad".into()).exit_code(), 1);
        assert_eq!(CliRunError::Layout(LayoutError::NoChapters).exit_code(), 1);
        assert_eq!(
            CliRunError::Split(SplitError::Layout(LayoutError::NoChapters)).exit_code(),
            1
        );
        assert_eq!(
            CliRunError::Export(ExportError::MissingInputs { files: vec![] }).exit_code(),
            1
        );
        assert_eq!(
            CliRunError::Crawler(CrawlerError::UnknownProfile {
                name: "x".into(),
                available: "y".into()
            })
            .exit_code(),
            1
        );
        assert_eq!(
            CliRunError::Crawler(CrawlerError::HttpStatus {
                status: 503,
                url: "https://example.com".into()
            })
            .exit_code(),
            2
        );
        assert_eq!(
            CliRunError::Render(RenderError::MissingOutput {
                path: PathBuf::from("a.pdf")
            })
            .exit_code(),
            3
        );
        assert_eq!(
            CliRunError::Cache(CacheError::NoPdfs(PathBuf::from("output/pdf"))).exit_code(),
            3
        );
        assert_eq!(CliRunError::Incomplete("1 failed".into()).exit_code(), 3);
    }
}
