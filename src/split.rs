//! Chapter splitter. Cuts the monolithic manuscript into one HTML file per chapter
//! using the fixed line ranges of [BookLayout](crate::model::BookLayout).

use crate::assemble::html_escape_attr;
use crate::model::{
    chapter_file_name, AppendixRange, BookLayout, ChapterRange, LayoutError, ProjectPaths,
    APPENDIX_FILE,
};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

const CHAPTER_TEMPLATE: &str = include_str!("templates/chapter.html");
const INDEX_TEMPLATE: &str = include_str!("templates/chapter_index.html");
const CHAPTER_DIV_OPEN: &str = r#"<div class="chapter">"#;
const DISABLED: &str = "disabled";

/// Errors from splitting and writing chapter files.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("{0}")]
    Layout(#[from] LayoutError),

    #[error("Cannot read manuscript {path}: {source}")]
    ReadManuscript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One generated file: name inside the chapters directory plus full HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub file_name: String,
    pub html: String,
}

/// Result of splitting: files to write and the parts whose range fell outside the manuscript.
#[derive(Debug, Clone, Default)]
pub struct SplitOutput {
    pub files: Vec<ChapterFile>,
    pub skipped: Vec<u32>,
    pub appendix_skipped: bool,
}

impl SplitOutput {
    /// `layout` restricted to the parts that were actually produced.
    pub fn written_layout(&self, layout: &BookLayout) -> BookLayout {
        let mut written = layout.clone();
        written.chapters.retain(|c| !self.skipped.contains(&c.num));
        if self.appendix_skipped {
            written.appendix = None;
        }
        written
    }
}

/// Lines `start..=end` (1-based), clamped to the manuscript. `None` when nothing is left.
fn slice_lines<'a>(lines: &[&'a str], start: usize, end: Option<usize>) -> Option<Vec<&'a str>> {
    let from = start.saturating_sub(1);
    let to = end.unwrap_or(lines.len()).min(lines.len());
    if from >= to {
        return None;
    }
    Some(lines[from..to].to_vec())
}

/// Wrap a fragment in the chapter div unless it already opens with one.
fn wrap_chapter(content: &str) -> String {
    if content.trim().starts_with(CHAPTER_DIV_OPEN) {
        content.to_string()
    } else {
        format!("        {}\n{}\n        </div>", CHAPTER_DIV_OPEN, content)
    }
}

struct NavLinks {
    prev_link: String,
    prev_class: &'static str,
    next_link: String,
    next_class: &'static str,
}

fn render_chapter(book_title: &str, title: &str, content: &str, nav: &NavLinks) -> String {
    let title = html_escape_attr(title);
    CHAPTER_TEMPLATE
        .replace("{{book_title}}", &html_escape_attr(book_title))
        .replace("{{title}}", &title)
        .replace("{{prev_link}}", &nav.prev_link)
        .replace("{{prev_class}}", nav.prev_class)
        .replace("{{next_link}}", &nav.next_link)
        .replace("{{next_class}}", nav.next_class)
        .replace("{{content}}", content)
}

fn nav_for(chapters: &[ChapterRange], i: usize, has_appendix: bool) -> NavLinks {
    let (prev_link, prev_class) = match i.checked_sub(1).and_then(|p| chapters.get(p)) {
        Some(prev) => (chapter_file_name(prev.num), ""),
        None => ("#".to_string(), DISABLED),
    };
    let (next_link, next_class) = match chapters.get(i + 1) {
        Some(next) => (chapter_file_name(next.num), ""),
        None if has_appendix => (APPENDIX_FILE.to_string(), ""),
        None => ("#".to_string(), DISABLED),
    };
    NavLinks {
        prev_link,
        prev_class,
        next_link,
        next_class,
    }
}

fn render_appendix(
    layout: &BookLayout,
    last_chapter: Option<&ChapterRange>,
    appendix: &AppendixRange,
    body: &[&str],
) -> ChapterFile {
    let (prev_link, prev_class) = match last_chapter {
        Some(c) => (chapter_file_name(c.num), ""),
        None => ("#".to_string(), DISABLED),
    };
    let nav = NavLinks {
        prev_link,
        prev_class,
        next_link: "#".to_string(),
        next_class: DISABLED,
    };
    let title = format!("附录：{}", appendix.title);
    ChapterFile {
        file_name: APPENDIX_FILE.to_string(),
        html: render_chapter(&layout.title, &title, &wrap_chapter(&body.join("\n")), &nav),
    }
}

/// Split manuscript text into chapter files (pure; nothing is written).
///
/// Parts whose start line lies past the end of the manuscript are skipped and recorded in
/// the output; navigation links only point at parts that were produced. Output is
/// deterministic for identical input.
pub fn split_manuscript(layout: &BookLayout, manuscript: &str) -> Result<SplitOutput, SplitError> {
    layout.validate()?;
    let lines: Vec<&str> = manuscript.split('\n').collect();
    let mut out = SplitOutput::default();

    let mut bodies = Vec::with_capacity(layout.chapters.len());
    for ch in &layout.chapters {
        match slice_lines(&lines, ch.start, ch.end) {
            Some(body) => bodies.push((ch, body)),
            None => {
                warn!(
                    "Chapter {} starts at line {} but the manuscript has {} lines; skipping",
                    ch.num,
                    ch.start,
                    lines.len()
                );
                out.skipped.push(ch.num);
            }
        }
    }

    let appendix = match &layout.appendix {
        Some(a) => match slice_lines(&lines, a.start, a.end) {
            Some(body) => Some((a, body)),
            None => {
                warn!(
                    "Appendix starts at line {} but the manuscript has {} lines; skipping",
                    a.start,
                    lines.len()
                );
                out.appendix_skipped = true;
                None
            }
        },
        None => None,
    };

    let written: Vec<ChapterRange> = bodies.iter().map(|(ch, _)| (*ch).clone()).collect();
    for (i, (ch, body)) in bodies.iter().enumerate() {
        let title = BookLayout::chapter_heading(ch);
        let content = wrap_chapter(&body.join("\n"));
        let nav = nav_for(&written, i, appendix.is_some());
        out.files.push(ChapterFile {
            file_name: chapter_file_name(ch.num),
            html: render_chapter(&layout.title, &title, &content, &nav),
        });
    }
    if let Some((a, body)) = appendix {
        out.files.push(render_appendix(layout, written.last(), a, &body));
    }

    Ok(out)
}

/// Chinese ordinal for chapter headings in the index (1..=99), e.g. 11 -> 十一.
pub fn chinese_numeral(n: u32) -> String {
    const DIGITS: [&str; 10] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
    match n {
        0..=9 => DIGITS[n as usize].to_string(),
        10 => "十".to_string(),
        11..=19 => format!("十{}", DIGITS[(n % 10) as usize]),
        20..=99 => {
            let tens = DIGITS[(n / 10) as usize];
            if n % 10 == 0 {
                format!("{}十", tens)
            } else {
                format!("{}十{}", tens, DIGITS[(n % 10) as usize])
            }
        }
        _ => n.to_string(),
    }
}

/// Render `chapters/index.html`, linking every chapter and the appendix.
pub fn render_chapter_index(layout: &BookLayout) -> String {
    let mut items = String::new();
    for ch in &layout.chapters {
        let icon = ch.icon.as_deref().map(|i| format!("{} ", i)).unwrap_or_default();
        items.push_str(&format!(
            "            <li class=\"chapter-item\">\n                <a href=\"{}\">{}第{}章：{}</a>\n            </li>\n",
            chapter_file_name(ch.num),
            icon,
            chinese_numeral(ch.num),
            html_escape_attr(&ch.title)
        ));
    }
    let mut stats = format!("{}章", layout.chapters.len());
    if let Some(ref a) = layout.appendix {
        items.push_str(&format!(
            "            <li class=\"chapter-item\">\n                <a href=\"{}\">📋 附录：{}</a>\n            </li>\n",
            APPENDIX_FILE,
            html_escape_attr(&a.title)
        ));
        stats.push_str(" + 1个附录");
    }
    INDEX_TEMPLATE
        .replace("{{book_title}}", &html_escape_attr(&layout.title))
        .replace("{{stats}}", &stats)
        .replace("{{items}}", items.trim_end_matches('\n'))
}

/// Read the manuscript, split it, and write chapter files plus the chapter index.
///
/// Returns the paths written. Existing files are overwritten.
pub fn run_split(paths: &ProjectPaths, layout: &BookLayout) -> Result<Vec<PathBuf>, SplitError> {
    let manuscript_path = crate::model::resolve(&paths.root, &layout.manuscript);
    info!("Reading manuscript {}", manuscript_path.display());
    let text = std::fs::read_to_string(&manuscript_path).map_err(|e| {
        SplitError::ReadManuscript {
            path: manuscript_path.clone(),
            source: e,
        }
    })?;
    let output = split_manuscript(layout, &text)?;
    write_split(paths, layout, &output)
}

/// Write split output and the chapter index into the chapters directory. The index lists
/// only the parts present in `output`.
pub fn write_split(
    paths: &ProjectPaths,
    layout: &BookLayout,
    output: &SplitOutput,
) -> Result<Vec<PathBuf>, SplitError> {
    std::fs::create_dir_all(&paths.chapters_dir).map_err(|e| SplitError::Write {
        path: paths.chapters_dir.clone(),
        source: e,
    })?;
    let mut written = Vec::with_capacity(output.files.len() + 1);
    for file in &output.files {
        let path = paths.chapters_dir.join(&file.file_name);
        std::fs::write(&path, &file.html).map_err(|e| SplitError::Write {
            path: path.clone(),
            source: e,
        })?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    let index_path = paths.chapters_dir.join("index.html");
    let index = render_chapter_index(&output.written_layout(layout));
    std::fs::write(&index_path, index).map_err(|e| SplitError::Write {
        path: index_path.clone(),
        source: e,
    })?;
    info!("Wrote {}", index_path.display());
    written.push(index_path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_layout() -> BookLayout {
        BookLayout {
            title: "Test Book".to_string(),
            short_title: String::new(),
            manuscript: PathBuf::from("book.html"),
            chapters: vec![
                ChapterRange {
                    num: 1,
                    title: "Colors".to_string(),
                    icon: Some("🌈".to_string()),
                    start: 2,
                    end: Some(3),
                },
                ChapterRange {
                    num: 2,
                    title: "Numbers".to_string(),
                    icon: None,
                    start: 4,
                    end: None,
                },
            ],
            appendix: Some(AppendixRange {
                title: "Dictionary".to_string(),
                start: 1,
                end: Some(1),
            }),
        }
    }

    const MANUSCRIPT: &str = "<p>dictionary</p>\n<h2>red</h2>\n<p>blue</p>\n<div class=\"chapter\"><p>one two</p></div>\n<p>three</p>";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bookpress_split_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn slice_lines_is_one_based_inclusive_and_clamped() {
        let lines = vec!["a", "b", "c"];
        assert_eq!(slice_lines(&lines, 1, Some(2)), Some(vec!["a", "b"]));
        assert_eq!(slice_lines(&lines, 2, None), Some(vec!["b", "c"]));
        assert_eq!(slice_lines(&lines, 3, Some(99)), Some(vec!["c"]));
        assert_eq!(slice_lines(&lines, 4, None), None);
    }

    #[test]
    fn wrap_chapter_only_when_missing() {
        assert!(wrap_chapter("<p>x</p>").contains(r#"<div class="chapter">"#));
        let already = "  <div class=\"chapter\"><p>x</p></div>";
        assert_eq!(wrap_chapter(already), already);
    }

    #[test]
    fn split_produces_one_file_per_chapter_plus_appendix() {
        let out = split_manuscript(&small_layout(), MANUSCRIPT).unwrap();
        let names: Vec<_> = out.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["chapter01.html", "chapter02.html", "appendix.html"]);
        assert!(out.skipped.is_empty());

        let ch1 = &out.files[0].html;
        assert!(ch1.contains("<h2>red</h2>"));
        assert!(ch1.contains("<p>blue</p>"));
        assert!(!ch1.contains("one two"));
        assert!(ch1.contains("第1章：Colors - Test Book"));
        // Chapter 1 is first: previous disabled, next is chapter 2.
        assert!(ch1.contains(r##"<a href="#" class="disabled">"##));
        assert!(ch1.contains(r#"<a href="chapter02.html" class="">"#));

        let ch2 = &out.files[1].html;
        assert!(ch2.contains("one two"));
        assert!(ch2.contains("<p>three</p>"));
        assert!(ch2.contains(r#"<a href="chapter01.html" class="">"#));
        assert!(ch2.contains(r#"<a href="appendix.html" class="">"#));
        // Content already starts with the chapter div, so it is not wrapped twice.
        assert_eq!(ch2.matches(r#"<div class="chapter">"#).count(), 1);

        let appendix = &out.files[2].html;
        assert!(appendix.contains("附录：Dictionary"));
        assert!(appendix.contains("<p>dictionary</p>"));
        assert!(appendix.contains(r##"<a href="#" class="disabled">"##));
    }

    #[test]
    fn last_chapter_without_appendix_has_disabled_next() {
        let mut layout = small_layout();
        layout.appendix = None;
        let out = split_manuscript(&layout, MANUSCRIPT).unwrap();
        assert_eq!(out.files.len(), 2);
        let ch2 = &out.files[1].html;
        assert!(ch2.contains(r##"<a href="#" class="disabled">下一章"##));
    }

    #[test]
    fn chapter_past_end_is_skipped() {
        let mut layout = small_layout();
        layout.chapters[1].start = 100;
        let out = split_manuscript(&layout, MANUSCRIPT).unwrap();
        assert_eq!(out.skipped, vec![2]);
        assert!(out.files.iter().all(|f| f.file_name != "chapter02.html"));
        // Chapter 1 now links straight to the appendix, and the appendix back to chapter 1.
        let ch1 = &out.files[0].html;
        assert!(!ch1.contains("chapter02.html"));
        assert!(ch1.contains(r#"<a href="appendix.html" class="">"#));
        assert!(out.files[1].html.contains(r#"<a href="chapter01.html" class="">"#));
        let index = render_chapter_index(&out.written_layout(&layout));
        assert!(!index.contains("chapter02.html"));
        assert!(index.contains("1章 + 1个附录"));
    }

    #[test]
    fn parts_past_end_leave_no_dangling_links() {
        let mut layout = small_layout();
        layout.chapters[0].start = 1;
        layout.chapters[0].end = Some(1);
        layout.chapters[1].start = 50;
        layout.appendix = Some(AppendixRange {
            title: "Dictionary".to_string(),
            start: 60,
            end: None,
        });
        let out = split_manuscript(&layout, "<p>a</p>\n<p>b</p>").unwrap();
        let names: Vec<_> = out.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["chapter01.html"]);
        assert_eq!(out.skipped, vec![2]);
        assert!(out.appendix_skipped);

        let ch1 = &out.files[0].html;
        assert!(!ch1.contains("chapter02.html"));
        assert!(!ch1.contains(APPENDIX_FILE));
        assert!(ch1.contains(r##"<a href="#" class="disabled">下一章"##));

        let index = render_chapter_index(&out.written_layout(&layout));
        assert!(index.contains("chapter01.html"));
        assert!(!index.contains("chapter02.html"));
        assert!(!index.contains(APPENDIX_FILE));
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let mut layout = small_layout();
        layout.chapters[0].end = Some(1);
        assert!(matches!(
            split_manuscript(&layout, MANUSCRIPT),
            Err(SplitError::Layout(LayoutError::EndBeforeStart { .. }))
        ));
    }

    #[test]
    fn titles_are_escaped() {
        let mut layout = small_layout();
        layout.chapters[0].title = "Cats & <Dogs>".to_string();
        let out = split_manuscript(&layout, MANUSCRIPT).unwrap();
        assert!(out.files[0].html.contains("Cats &amp; &lt;Dogs&gt;"));
    }

    #[test]
    fn chinese_numerals() {
        assert_eq!(chinese_numeral(1), "一");
        assert_eq!(chinese_numeral(10), "十");
        assert_eq!(chinese_numeral(11), "十一");
        assert_eq!(chinese_numeral(20), "二十");
        assert_eq!(chinese_numeral(23), "二十三");
        assert_eq!(chinese_numeral(100), "100");
    }

    #[test]
    fn chapter_index_links_relative_to_chapters_dir() {
        let html = render_chapter_index(&small_layout());
        assert!(html.contains(r#"<a href="chapter01.html">🌈 第一章：Colors</a>"#));
        assert!(html.contains(r#"<a href="chapter02.html">第二章：Numbers</a>"#));
        assert!(html.contains(r#"<a href="appendix.html">📋 附录：Dictionary</a>"#));
        assert!(html.contains("2章 + 1个附录"));
    }

    #[test]
    fn run_split_writes_non_empty_files_and_is_idempotent() {
        let dir = scratch_dir("run");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("book.html"), MANUSCRIPT).unwrap();
        let paths = ProjectPaths::new(&dir);
        let layout = small_layout();

        let written = run_split(&paths, &layout).unwrap();
        assert_eq!(written.len(), 4);
        let first: Vec<String> = written
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        assert!(first.iter().all(|s| !s.trim().is_empty()));

        run_split(&paths, &layout).unwrap();
        let second: Vec<String> = written
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        assert_eq!(first, second);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn run_split_missing_manuscript_errors() {
        let dir = scratch_dir("missing");
        let paths = ProjectPaths::new(&dir);
        assert!(matches!(
            run_split(&paths, &small_layout()),
            Err(SplitError::ReadManuscript { .. })
        ));
    }
}
