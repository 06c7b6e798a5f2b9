//! Chapter assembler. Reads chapter and cover files in reading order, keeps their styles and
//! body content, strips navigation, and produces one printable HTML document.

use crate::model::{file_stem_for, print_sequence, BookLayout, BookPart, ProjectPaths};
use regex::Regex;
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{info, warn};

const PRINT_CSS: &str = include_str!("templates/print.css");
pub(crate) const PAGE_BREAK: &str = r#"<div class="page-break"></div>"#;

/// Errors from HTML assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which elements to remove from a page body before it is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripSet {
    /// Browser print edition: scripts only; navigation is hidden by CSS.
    Print,
    /// Full-book PDF: navigation bars and preview notes.
    Book,
    /// Single-chapter export: navigation bars, back links, scripts.
    ChapterExport,
    /// Professional print: scripts, fixed overlays, pronunciation guide.
    Professional,
}

impl StripSet {
    fn selector(self) -> &'static str {
        match self {
            StripSet::Print => "script",
            StripSet::Book => {
                "nav.chapter-nav, div.chapter-nav, nav.navigation, div.navigation, \
                 nav.project-nav, div.project-nav, div.preview-note"
            }
            StripSet::ChapterExport => "div.chapter-nav, a.back-link, script",
            StripSet::Professional => {
                "script, noscript, [style*=\"position: fixed\"], [style*=\"position:fixed\"], \
                 #pronunciation-guide, #previewNote"
            }
        }
    }
}

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, AssembleError> {
    Selector::parse(sel).map_err(|e| AssembleError::Selector {
        selector: sel.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn html_escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Detach every element matching `selector` from the document tree.
pub(crate) fn remove_matching(doc: &mut Html, selector: &Selector) {
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Text of every `<style>` element, joined by newlines.
pub fn extract_styles(html: &str) -> Result<String, AssembleError> {
    let doc = Html::parse_document(html);
    let sel = parse_selector("style")?;
    let styles: Vec<String> = doc
        .select(&sel)
        .map(|s| s.text().collect::<String>())
        .filter(|s| !s.trim().is_empty())
        .collect();
    Ok(styles.join("\n"))
}

/// Inner HTML of `<body>` after removing the elements in `strip`.
pub fn extract_body(html: &str, strip: StripSet) -> Result<String, AssembleError> {
    let mut doc = Html::parse_document(html);
    let strip_sel = parse_selector(strip.selector())?;
    remove_matching(&mut doc, &strip_sel);
    let body_sel = parse_selector("body")?;
    Ok(doc
        .select(&body_sel)
        .next()
        .map(|b| b.inner_html())
        .unwrap_or_default())
}

fn src_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src="([^"]*)""#).expect("static regex"))
}

/// Drop one leading `./` or `../` from local image sources so they resolve next to the
/// assembled file. Remote (`http...`) and `data:` sources are left alone.
pub fn relativize_image_paths(html: &str) -> String {
    src_attr_re()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let path = &caps[1];
            if path.starts_with("http") || path.starts_with("data:") {
                return caps[0].to_string();
            }
            let trimmed = path
                .strip_prefix("./")
                .or_else(|| path.strip_prefix("../"))
                .unwrap_or(path);
            format!("src=\"{}\"", trimmed)
        })
        .into_owned()
}

/// Rewrite local image sources as `file://` URLs for the PDF renderer.
///
/// `../x` resolves against the project root; other relative paths against the chapters
/// directory. Absolute paths and remote sources are untouched.
pub fn absolutize_image_paths(html: &str, paths: &ProjectPaths) -> String {
    src_attr_re()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let old = &caps[1];
            if old.starts_with("http") || old.starts_with('/') || old.starts_with("data:") {
                return caps[0].to_string();
            }
            let resolved = if old.starts_with("../") {
                paths.root.join(old.replace("../", ""))
            } else {
                paths.chapters_dir.join(old)
            };
            format!("src=\"file://{}\"", resolved.display())
        })
        .into_owned()
}

/// Read one book part. Missing or unreadable files are logged and yield `None`.
pub fn read_part(part: BookPart, paths: &ProjectPaths) -> Option<String> {
    let path = part.path(paths)?;
    if !path.exists() {
        warn!("{} not found at {}; skipping", part.label(), path.display());
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Cannot read {}: {}; skipping", path.display(), e);
            None
        }
    }
}

/// Parts whose styles are carried into merged documents.
pub(crate) fn contributes_styles(part: BookPart, layout: &BookLayout) -> bool {
    match part {
        BookPart::FrontCover | BookPart::Contents => true,
        BookPart::Chapter(n) => layout.chapters.first().is_some_and(|c| c.num == n),
        _ => false,
    }
}

/// Merged browser-print document and which parts went into it.
#[derive(Debug, Clone)]
pub struct PrintEdition {
    pub html: String,
    pub included: Vec<BookPart>,
    pub skipped: Vec<BookPart>,
}

/// Build the single-file print edition from covers, contents, chapters and appendix.
pub fn build_print_version(
    paths: &ProjectPaths,
    layout: &BookLayout,
) -> Result<PrintEdition, AssembleError> {
    let mut styles = Vec::new();
    let mut content = Vec::new();
    let mut included = Vec::new();
    let mut skipped = Vec::new();

    for part in print_sequence(layout) {
        info!("Processing {}", part.label());
        let Some(html) = read_part(part, paths) else {
            skipped.push(part);
            continue;
        };
        if contributes_styles(part, layout) {
            let s = extract_styles(&html)?;
            if !s.is_empty() {
                styles.push(s);
            }
        }
        let mut body = extract_body(&html, StripSet::Print)?;
        if part != BookPart::BackCover {
            body.push_str(PAGE_BREAK);
        }
        content.push(body);
        included.push(part);
    }

    let combined = relativize_image_paths(&content.join("\n"));
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - 打印版</title>
    <style>
{styles}
{print_css}
    </style>
</head>
<body>
    <div class="print-info">
        📖 打印版本已准备就绪<br>
        按 Ctrl+P 开始打印
    </div>

{content}
</body>
</html>
"#,
        title = html_escape_attr(&layout.title),
        styles = styles.join("\n"),
        print_css = PRINT_CSS,
        content = combined
    );
    Ok(PrintEdition {
        html,
        included,
        skipped,
    })
}

/// Build the print edition and write it to `output/{title}-print.html`.
pub fn write_print_version(
    paths: &ProjectPaths,
    layout: &BookLayout,
) -> Result<(PathBuf, PrintEdition), AssembleError> {
    let edition = build_print_version(paths, layout)?;
    std::fs::create_dir_all(&paths.output_dir).map_err(|e| AssembleError::Write {
        path: paths.output_dir.clone(),
        source: e,
    })?;
    let path = paths
        .output_dir
        .join(format!("{}-print.html", file_stem_for(&layout.title)));
    std::fs::write(&path, &edition.html).map_err(|e| AssembleError::Write {
        path: path.clone(),
        source: e,
    })?;
    info!("Wrote {}", path.display());
    Ok((path, edition))
}
