//! PDF exporters: the duplex full book, the professional trim-size edition, one file per
//! chapter, and the covers on their own.

use crate::assemble::{
    absolutize_image_paths, contributes_styles, extract_body, extract_styles, html_escape_attr,
    read_part, AssembleError, StripSet, PAGE_BREAK,
};
use crate::model::{
    chapter_file_name, file_stem_for, pdf_sequence, print_sequence, BookLayout, BookPart,
    ProjectPaths, APPENDIX_FILE,
};
use crate::render::{PdfRenderer, RenderError};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{error, info, warn};

const BOOK_CSS: &str = include_str!("templates/book_pdf.css");
const PROFESSIONAL_CSS: &str = include_str!("templates/professional.css");
const CHAPTER_CSS: &str = include_str!("templates/chapter_export.css");
const COVER_A4_CSS: &str = include_str!("templates/cover_a4.css");
const COVER_PROFESSIONAL_CSS: &str = include_str!("templates/cover_professional.css");

const BROWSER_HINT_CSS: &str = r#"
        @media screen {
            body { max-width: 210mm; margin: 20px auto; padding: 20px; box-shadow: 0 0 20px rgba(0,0,0,0.1); }
            .print-hint { background: #e3f2fd; border: 2px solid #2196f3; padding: 15px; border-radius: 8px; margin: 20px 0; text-align: center; font-weight: bold; color: #1976d2; }
        }
        @media print { .print-hint { display: none; } }
"#;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Missing input files: {}", .files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    MissingInputs { files: Vec<PathBuf> },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Page size for per-chapter export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    /// 16开, 185 x 260 mm.
    #[default]
    Kai16,
    /// 大32开, 130 x 185 mm.
    Kai32,
    A5,
    A4,
}

impl PageFormat {
    pub fn page_size(self) -> &'static str {
        match self {
            PageFormat::Kai16 => "185mm 260mm",
            PageFormat::Kai32 => "130mm 185mm",
            PageFormat::A5 => "A5",
            PageFormat::A4 => "A4",
        }
    }

    pub fn margin(self) -> &'static str {
        match self {
            PageFormat::Kai16 | PageFormat::A5 => "15mm",
            PageFormat::Kai32 => "12mm",
            PageFormat::A4 => "20mm",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageFormat::Kai16 => "16开本(185×260mm)",
            PageFormat::Kai32 => "大32开(130×185mm)",
            PageFormat::A5 => "A5(148×210mm)",
            PageFormat::A4 => "A4(210×297mm)",
        }
    }
}

/// What the per-chapter export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChapterMode {
    Pdf,
    Browser,
    #[default]
    Both,
}

impl ChapterMode {
    fn pdf(self) -> bool {
        matches!(self, ChapterMode::Pdf | ChapterMode::Both)
    }

    fn browser(self) -> bool {
        matches!(self, ChapterMode::Browser | ChapterMode::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSide {
    Front,
    Back,
}

impl CoverSide {
    fn part(self) -> BookPart {
        match self {
            CoverSide::Front => BookPart::FrontCover,
            CoverSide::Back => BookPart::BackCover,
        }
    }

    fn slug(self) -> &'static str {
        match self {
            CoverSide::Front => "front",
            CoverSide::Back => "back",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverMode {
    /// Trim-size artwork centred on an A4 sheet for home printers.
    A4,
    /// Raw 185 x 260 mm trim for a print shop.
    Professional,
}

impl CoverMode {
    fn css(self) -> &'static str {
        match self {
            CoverMode::A4 => COVER_A4_CSS,
            CoverMode::Professional => COVER_PROFESSIONAL_CSS,
        }
    }

    fn slug(self) -> &'static str {
        match self {
            CoverMode::A4 => "a4",
            CoverMode::Professional => "professional",
        }
    }
}

/// Files the full-book export needs that are not on disk.
pub fn check_book_inputs(paths: &ProjectPaths, layout: &BookLayout) -> Vec<PathBuf> {
    pdf_sequence(layout)
        .into_iter()
        .filter_map(|part| part.path(paths))
        .filter(|p| !p.exists())
        .collect()
}

fn document(title: &str, css: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>
{}
    </style>
</head>
<body>
{}
</body>
</html>
"#,
        html_escape_attr(title),
        css,
        body
    )
}

/// Escape text for use between double quotes in a CSS string. `<` is escaped so a title
/// cannot close the surrounding `<style>` element.
fn css_string_content(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\A "),
            '<' => out.push_str("\\3C "),
            _ => out.push(c),
        }
    }
    out
}

/// Merged HTML for the duplex full-book PDF.
pub fn build_book_html(paths: &ProjectPaths, layout: &BookLayout) -> Result<String, ExportError> {
    let mut styles = Vec::new();
    let mut content: Vec<String> = Vec::new();

    for part in pdf_sequence(layout) {
        if part == BookPart::BlankPage {
            content.push(r#"<div class="blank-page"></div>"#.to_string());
            continue;
        }
        let Some(html) = read_part(part, paths) else {
            continue;
        };
        info!("Processing {}", part.label());
        if contributes_styles(part, layout) {
            let s = extract_styles(&html)?;
            if !s.is_empty() {
                styles.push(s);
            }
        }
        let body = if part.is_cover() {
            let class = if part == BookPart::FrontCover {
                "pdf-front-cover"
            } else {
                "pdf-back-cover"
            };
            let inner = extract_body(&html, StripSet::Print)?;
            format!(r#"<div class="{}">{}</div>"#, class, inner)
        } else {
            let inner = extract_body(&html, StripSet::Book)?;
            if content.is_empty() {
                inner
            } else {
                format!("{}{}", PAGE_BREAK, inner)
            }
        };
        content.push(body);
    }

    let css = format!("{}\n{}", styles.join("\n"), BOOK_CSS);
    let html = document(&layout.title, &css, &content.join("\n"));
    Ok(absolutize_image_paths(&html, paths))
}

/// Render the full book to `output/pdf/{title}.pdf`. Missing inputs abort before rendering.
pub fn export_book_pdf(
    paths: &ProjectPaths,
    layout: &BookLayout,
    renderer: &dyn PdfRenderer,
) -> Result<PathBuf, ExportError> {
    let missing = check_book_inputs(paths, layout);
    if !missing.is_empty() {
        for m in &missing {
            warn!("Missing input: {}", m.display());
        }
        return Err(ExportError::MissingInputs { files: missing });
    }
    let html = build_book_html(paths, layout)?;
    let out = paths
        .output_dir
        .join("pdf")
        .join(format!("{}.pdf", file_stem_for(&layout.title)));
    renderer.render(&html, &paths.root, &out)?;
    info!("PDF written to {}", out.display());
    Ok(out)
}

/// Merged HTML for the professional edition: no blank pages, one wrapper per part.
pub fn build_professional_html(
    paths: &ProjectPaths,
    layout: &BookLayout,
) -> Result<String, ExportError> {
    let mut styles = Vec::new();
    let mut content = Vec::new();

    for (i, part) in print_sequence(layout).into_iter().enumerate() {
        let Some(html) = read_part(part, paths) else {
            continue;
        };
        info!("Processing {}", part.label());
        if contributes_styles(part, layout) {
            let s = extract_styles(&html)?;
            if !s.is_empty() {
                styles.push(s);
            }
        }
        let inner = extract_body(&html, StripSet::Professional)?;
        content.push(format!(
            r#"<div class="page-wrapper" data-page="{}">{}</div>"#,
            i + 1,
            inner
        ));
    }

    let professional = PROFESSIONAL_CSS.replace(
        "{{running_header}}",
        &css_string_content(layout.running_header()),
    );
    let css = format!("{}\n{}", professional, styles.join("\n"));
    let html = document(&format!("{} - 专业印刷版", layout.title), &css, &content.join("\n"));
    Ok(absolutize_image_paths(&html, paths))
}

/// Render the professional edition to `output/professional/{title}-professional.pdf`.
pub fn export_professional_pdf(
    paths: &ProjectPaths,
    layout: &BookLayout,
    renderer: &dyn PdfRenderer,
) -> Result<PathBuf, ExportError> {
    let html = build_professional_html(paths, layout)?;
    let out = paths
        .output_dir
        .join("professional")
        .join(format!("{}-professional.pdf", file_stem_for(&layout.title)));
    renderer.render(&html, &paths.root, &out)?;
    info!("Professional PDF written to {}", out.display());
    Ok(out)
}

/// One exportable chapter or the appendix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub file_name: String,
    /// Output file stem, e.g. `第03章-数字单词的密码破解`.
    pub label: String,
}

pub fn chapter_entries(layout: &BookLayout) -> Vec<ChapterEntry> {
    let mut entries: Vec<ChapterEntry> = layout
        .chapters
        .iter()
        .map(|c| ChapterEntry {
            file_name: chapter_file_name(c.num),
            label: file_stem_for(&format!("第{:02}章-{}", c.num, c.title)),
        })
        .collect();
    if let Some(ref a) = layout.appendix {
        entries.push(ChapterEntry {
            file_name: APPENDIX_FILE.to_string(),
            label: file_stem_for(&format!("附录-{}", a.title)),
        });
    }
    entries
}

fn parent_img_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(<img\b[^>]*?\bsrc=")\.\./([^"]*)""#).expect("static regex"))
}

/// `<img src="../x">` becomes the absolute path of `root/x` when that file exists.
pub fn resolve_parent_images(html: &str, paths: &ProjectPaths) -> String {
    parent_img_re()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let candidate = paths.root.join(&caps[2]);
            if candidate.exists() {
                let abs = std::fs::canonicalize(&candidate).unwrap_or(candidate);
                format!("{}{}\"", &caps[1], abs.display())
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Outcome of a per-chapter export run.
#[derive(Debug, Default)]
pub struct ChapterExportSummary {
    pub pdfs: Vec<PathBuf>,
    pub browser_pages: Vec<PathBuf>,
    /// Label and reason for every chapter that could not be exported.
    pub failed: Vec<(String, String)>,
    pub total: usize,
}

fn chapter_body(entry: &ChapterEntry, paths: &ProjectPaths) -> Result<String, String> {
    let path = paths.chapters_dir.join(&entry.file_name);
    let html = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let body = extract_body(&html, StripSet::ChapterExport).map_err(|e| e.to_string())?;
    Ok(resolve_parent_images(&body, paths))
}

/// Export every chapter and the appendix on its own. A failing chapter is logged and
/// recorded in the summary; the rest continue.
pub fn export_chapters(
    paths: &ProjectPaths,
    layout: &BookLayout,
    format: PageFormat,
    mode: ChapterMode,
    renderer: &dyn PdfRenderer,
    progress: Option<&dyn Fn(u32, u32)>,
) -> Result<ChapterExportSummary, ExportError> {
    let out_dir = paths.output_dir.join("chapters_pdf");
    let browser_dir = out_dir.join("browser_print");
    let dir = if mode.browser() { &browser_dir } else { &out_dir };
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Write {
        path: dir.clone(),
        source: e,
    })?;

    let css = CHAPTER_CSS
        .replace("{{page_size}}", format.page_size())
        .replace("{{margin}}", format.margin());
    let entries = chapter_entries(layout);
    let total = entries.len() as u32;
    let mut summary = ChapterExportSummary {
        total: entries.len(),
        ..Default::default()
    };
    info!("Exporting {} chapters as {}", total, format.name());

    for (i, entry) in entries.iter().enumerate() {
        if let Some(cb) = progress {
            cb(i as u32 + 1, total);
        }
        let body = match chapter_body(entry, paths) {
            Ok(b) => b,
            Err(reason) => {
                error!("{}: {}", entry.label, reason);
                summary.failed.push((entry.label.clone(), reason));
                continue;
            }
        };

        if mode.pdf() {
            let html = document(
                &format!("{} - {}", entry.label, layout.running_header()),
                &css,
                &body,
            );
            let out = out_dir.join(format!("{}.pdf", entry.label));
            match renderer.render(&html, &paths.root, &out) {
                Ok(()) => {
                    info!("Wrote {}", out.display());
                    summary.pdfs.push(out);
                }
                Err(e) => {
                    error!("{}: {}", entry.label, e);
                    summary.failed.push((entry.label.clone(), e.to_string()));
                }
            }
        }

        if mode.browser() {
            let hinted = format!(
                "<div class=\"print-hint\">💡 按 Ctrl+P 打印此章节，选择\"保存为PDF\"即可导出PDF文件</div>\n{}",
                body
            );
            let html = document(
                &format!("{} - 打印版", entry.label),
                &format!("{}\n{}", css, BROWSER_HINT_CSS),
                &hinted,
            );
            let out = browser_dir.join(format!("{}-print.html", entry.label));
            match std::fs::write(&out, html) {
                Ok(()) => summary.browser_pages.push(out),
                Err(e) => {
                    error!("Cannot write {}: {}", out.display(), e);
                    summary.failed.push((entry.label.clone(), e.to_string()));
                }
            }
        }
    }

    info!(
        "Chapter export finished: {} PDF, {} browser pages, {} failed",
        summary.pdfs.len(),
        summary.browser_pages.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Put a stylesheet at the end of `<head>`, or at the top when there is no head.
fn inject_stylesheet(html: &str, css: &str) -> String {
    let tag = format!("<style>\n{}\n</style>\n", css);
    match html.find("</head>") {
        Some(pos) => format!("{}{}{}", &html[..pos], tag, &html[pos..]),
        None => format!("{}{}", tag, html),
    }
}

#[derive(Debug, Default)]
pub struct CoverSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

/// Export each requested cover in each requested mode to `output/cover-{side}-{mode}.pdf`.
pub fn export_covers(
    paths: &ProjectPaths,
    sides: &[CoverSide],
    modes: &[CoverMode],
    renderer: &dyn PdfRenderer,
) -> CoverSummary {
    let mut summary = CoverSummary::default();
    for &side in sides {
        let part = side.part();
        let Some(html) = read_part(part, paths) else {
            for &mode in modes {
                summary.failed.push((
                    format!("cover-{}-{}", side.slug(), mode.slug()),
                    format!("{} not found", part.label()),
                ));
            }
            continue;
        };
        for &mode in modes {
            let name = format!("cover-{}-{}", side.slug(), mode.slug());
            let out = paths.output_dir.join(format!("{}.pdf", name));
            let styled = inject_stylesheet(&html, mode.css());
            match renderer.render(&styled, &paths.root, &out) {
                Ok(()) => {
                    info!("Cover written to {}", out.display());
                    summary.written.push(out);
                }
                Err(e) => {
                    error!("{}: {}", name, e);
                    summary.failed.push((name, e.to_string()));
                }
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::tests::{scratch_project, two_chapter_layout, write_book};
    use crate::model::AppendixRange;
    use std::cell::RefCell;
    use std::path::Path;

    /// Records every render call and writes the HTML to the output path.
    #[derive(Default)]
    struct FakeRenderer {
        calls: RefCell<Vec<(PathBuf, String)>>,
        fail_on: Option<&'static str>,
    }

    impl PdfRenderer for FakeRenderer {
        fn render(&self, html: &str, _base: &Path, output: &Path) -> Result<(), RenderError> {
            let name = output.display().to_string();
            if self.fail_on.is_some_and(|f| name.contains(f)) {
                return Err(RenderError::Failed {
                    program: "fake".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: String::new(),
                });
            }
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(output, html).unwrap();
            self.calls
                .borrow_mut()
                .push((output.to_path_buf(), html.to_string()));
            Ok(())
        }
    }

    #[test]
    fn page_formats_match_print_sizes() {
        assert_eq!(PageFormat::default(), PageFormat::Kai16);
        assert_eq!(PageFormat::Kai16.page_size(), "185mm 260mm");
        assert_eq!(PageFormat::Kai32.margin(), "12mm");
        assert_eq!(PageFormat::A4.margin(), "20mm");
        assert_eq!(PageFormat::A5.page_size(), "A5");
    }

    #[test]
    fn book_html_wraps_covers_and_inserts_blank_pages() {
        let paths = scratch_project("book_html");
        write_book(&paths);
        let html = build_book_html(&paths, &two_chapter_layout()).unwrap();
        assert!(html.contains(r#"<div class="pdf-front-cover"><div class="book-cover">COVER</div>"#));
        assert!(html.contains(r#"<div class="pdf-back-cover">"#));
        assert_eq!(html.matches(r#"<div class="blank-page"></div>"#).count(), 2);
        // Contents and two chapters each start on a new page.
        assert_eq!(html.matches(PAGE_BREAK).count(), 3);
        assert!(!html.contains("chapter-nav\""));
        assert!(!html.contains("draft"));
        let expected = format!(
            "src=\"file://{}\"",
            paths.root.join("assets/images/red.png").display()
        );
        assert!(html.contains(&expected));
        let blank = html.find("blank-page\"></div>").unwrap();
        let contents = html.find("CONTENTS").unwrap();
        assert!(html.find("COVER").unwrap() < blank && blank < contents);
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn book_export_refuses_missing_inputs() {
        let paths = scratch_project("book_missing");
        write_book(&paths);
        std::fs::remove_file(paths.root.join("index.html")).unwrap();
        let renderer = FakeRenderer::default();
        let err = export_book_pdf(&paths, &two_chapter_layout(), &renderer).unwrap_err();
        match err {
            ExportError::MissingInputs { files } => {
                assert_eq!(files, vec![paths.root.join("index.html")]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(renderer.calls.borrow().is_empty());
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn book_export_renders_to_pdf_dir() {
        let paths = scratch_project("book_pdf");
        write_book(&paths);
        let renderer = FakeRenderer::default();
        let out = export_book_pdf(&paths, &two_chapter_layout(), &renderer).unwrap();
        assert_eq!(out, paths.output_dir.join("pdf").join("Test Book.pdf"));
        assert_eq!(renderer.calls.borrow().len(), 1);
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn professional_html_numbers_page_wrappers() {
        let paths = scratch_project("professional");
        write_book(&paths);
        let renderer = FakeRenderer::default();
        let out = export_professional_pdf(&paths, &two_chapter_layout(), &renderer).unwrap();
        assert!(out.ends_with("output/professional/Test Book-professional.pdf"));
        let html = &renderer.calls.borrow()[0].1;
        assert!(html.contains(r#"data-page="1""#));
        assert!(html.contains(r#"data-page="5""#));
        assert!(!html.contains("blank-page\"></div>"));
        assert!(html.contains(r#"content: "Test""#));
        assert!(!html.contains("console.log"));
        assert!(!html.contains("position: fixed; bottom"));
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn running_header_is_a_valid_css_string() {
        assert_eq!(css_string_content("Plain"), "Plain");
        assert_eq!(css_string_content(r#"A "B" \ C"#), r#"A \"B\" \\ C"#);
        assert_eq!(css_string_content("x</style>"), r"x\3C /style>");
        assert_eq!(css_string_content("a\nb"), r"a\A b");

        let paths = scratch_project("header_escape");
        write_book(&paths);
        let mut layout = two_chapter_layout();
        layout.short_title = r#"Cat \ "Dog""#.to_string();
        let html = build_professional_html(&paths, &layout).unwrap();
        assert!(html.contains(r#"content: "Cat \\ \"Dog\"""#));
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn chapter_labels_are_padded() {
        let mut layout = two_chapter_layout();
        layout.appendix = Some(AppendixRange {
            title: "Words".to_string(),
            start: 3,
            end: None,
        });
        let entries = chapter_entries(&layout);
        assert_eq!(entries[0].label, "第01章-One");
        assert_eq!(entries[0].file_name, "chapter01.html");
        assert_eq!(entries[2].label, "附录-Words");
        assert_eq!(entries[2].file_name, "appendix.html");
    }

    #[test]
    fn chapter_export_continues_past_failures() {
        let paths = scratch_project("chapters");
        write_book(&paths);
        std::fs::create_dir_all(&paths.images_dir).unwrap();
        std::fs::write(paths.images_dir.join("red.png"), b"png").unwrap();
        let mut layout = two_chapter_layout();
        layout.appendix = Some(AppendixRange {
            title: "Words".to_string(),
            start: 3,
            end: None,
        });
        let renderer = FakeRenderer {
            fail_on: Some("第02章"),
            ..Default::default()
        };
        let seen = RefCell::new(Vec::new());
        let progress = |n: u32, total: u32| seen.borrow_mut().push((n, total));
        let summary = export_chapters(
            &paths,
            &layout,
            PageFormat::A4,
            ChapterMode::Both,
            &renderer,
            Some(&progress),
        )
        .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.pdfs.len(), 1);
        // Chapter two fails to render; the appendix file does not exist.
        assert_eq!(summary.failed.len(), 2);
        assert_eq!(summary.browser_pages.len(), 2);
        assert_eq!(*seen.borrow(), vec![(1, 3), (2, 3), (3, 3)]);

        let pdf_html = &renderer.calls.borrow()[0].1;
        assert!(pdf_html.contains("size: A4; margin: 20mm;"));
        assert!(!pdf_html.contains(r#"class="back-link""#));
        assert!(!pdf_html.contains(">back</a>"));
        let abs = std::fs::canonicalize(paths.images_dir.join("red.png")).unwrap();
        assert!(pdf_html.contains(&format!("src=\"{}\"", abs.display())));

        let browser = std::fs::read_to_string(
            paths
                .output_dir
                .join("chapters_pdf/browser_print/第01章-One-print.html"),
        )
        .unwrap();
        assert!(browser.contains("print-hint"));
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn parent_images_kept_when_missing() {
        let paths = ProjectPaths::new("/nonexistent-bookpress");
        let html = r#"<img class="x" src="../assets/images/none.png">"#;
        assert_eq!(resolve_parent_images(html, &paths), html);
    }

    #[test]
    fn covers_render_each_side_and_mode() {
        let paths = scratch_project("covers");
        write_book(&paths);
        std::fs::remove_file(paths.root.join("book_back_cover.html")).unwrap();
        let renderer = FakeRenderer::default();
        let summary = export_covers(
            &paths,
            &[CoverSide::Front, CoverSide::Back],
            &[CoverMode::A4, CoverMode::Professional],
            &renderer,
        );
        assert_eq!(
            summary.written,
            vec![
                paths.output_dir.join("cover-front-a4.pdf"),
                paths.output_dir.join("cover-front-professional.pdf")
            ]
        );
        assert_eq!(summary.failed.len(), 2);
        let a4 = &renderer.calls.borrow()[0].1;
        assert!(a4.contains("size: 210mm 297mm"));
        assert!(a4.find("<style>\n").unwrap() < a4.find("</head>").unwrap());
        std::fs::remove_dir_all(&paths.root).ok();
    }

    #[test]
    fn stylesheet_injected_without_head() {
        assert_eq!(inject_stylesheet("<p>x</p>", "a{}"), "<style>\na{}\n</style>\n<p>x</p>");
    }
}
