//! bookpress: split a manuscript into chapters, assemble print and PDF editions,
//! prune unused images and crawl reference pictures for an illustrated e-book.

pub mod assemble;
pub mod cache;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod export;
pub mod images;
pub mod logging;
pub mod model;
pub mod pronounce;
pub mod render;
pub mod split;

// Re-exports for CLI and consumers.
pub use assemble::{build_print_version, write_print_version, AssembleError, StripSet};
pub use cache::{CacheError, CacheKind, CacheManager};
pub use crawler::{
    builtin_profile, run_crawl, CategoryProfile, CrawlOptions, CrawlerError, PoliteClient,
    PoliteClientBuilder, SearchEngine,
};
pub use export::{
    export_book_pdf, export_chapters, export_covers, export_professional_pdf, ExportError,
    PageFormat,
};
pub use images::{analyze, backup_and_clean, ImageError, UsageReport};
pub use model::{BookLayout, BookPart, LayoutError, ProjectPaths};
pub use pronounce::add_pronunciation;
pub use render::{CommandRenderer, PdfRenderer, RenderError};
pub use split::{run_split, split_manuscript, SplitError};
