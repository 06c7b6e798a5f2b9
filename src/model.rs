//! Book layout and project paths shared by every tool.
//!
//! The manuscript is cut by fixed line ranges; the defaults below describe the
//! production book. A `[book]` table in the config file replaces them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One chapter cut from the manuscript. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub num: u32,
    pub title: String,
    /// Emoji or short marker shown in the chapter index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub start: usize,
    /// Last line (inclusive). `None` runs to the end of the manuscript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// Appendix (dictionary and answer key) cut from the manuscript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendixRange {
    pub title: String,
    pub start: usize,
    pub end: Option<usize>,
}

/// Everything the splitter and exporters need to know about the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLayout {
    /// Full title, used in page titles and output file names.
    pub title: String,
    /// Running header for the professional print edition. Empty falls back to `title`.
    #[serde(default)]
    pub short_title: String,
    /// Manuscript path, relative to the project root.
    pub manuscript: PathBuf,
    pub chapters: Vec<ChapterRange>,
    #[serde(default)]
    pub appendix: Option<AppendixRange>,
}

/// Layout problems found before any file is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Book layout has no chapters.")]
    NoChapters,

    #[error("Chapter {num}: start line must be >= 1.")]
    ZeroStart { num: u32 },

    #[error("Chapter {num}: end line {end} is before start line {start}.")]
    EndBeforeStart { num: u32, start: usize, end: usize },

    #[error("Chapter number {num} appears more than once.")]
    DuplicateChapter { num: u32 },

    #[error("Appendix: invalid line range {start}..{end:?}.")]
    InvalidAppendix { start: usize, end: Option<usize> },
}

fn chapter(num: u32, title: &str, icon: &str, start: usize, end: Option<usize>) -> ChapterRange {
    ChapterRange {
        num,
        title: title.to_string(),
        icon: Some(icon.to_string()),
        start,
        end,
    }
}

impl Default for BookLayout {
    fn default() -> Self {
        Self {
            title: "柯南侦探英语冒险：杨乐北的单词探案记".to_string(),
            short_title: "柯南侦探英语冒险".to_string(),
            manuscript: PathBuf::from("柯南侦探英语冒险：杨乐北的单词探案记.html"),
            chapters: vec![
                chapter(1, "魔法学院的入学考试", "✨", 685, Some(1940)),
                chapter(2, "颜色单词的魔法咒语", "🌈", 1941, Some(3056)),
                chapter(3, "数字单词的密码破解", "🔢", 3057, Some(4033)),
                chapter(4, "罗小黑的奇妙相遇", "🐱", 4293, Some(4663)),
                chapter(5, "魔法生物的语言", "🦄", 4664, Some(5504)),
                chapter(6, "魔法地图的探索", "🗺️", 5505, Some(6484)),
                chapter(7, "魔法图书馆的秘密", "📚", 6485, Some(7525)),
                chapter(8, "魔法竞技场的挑战", "🏟️", 7526, Some(8732)),
                chapter(9, "魔法天气的预测", "🌦️", 8733, Some(9743)),
                chapter(10, "魔法时间的旅行", "⏰", 9744, Some(10925)),
                chapter(11, "最终魔法考试", "🎓", 10926, None),
            ],
            appendix: Some(AppendixRange {
                title: "魔法词典和参考答案".to_string(),
                start: 4034,
                end: Some(4292),
            }),
        }
    }
}

impl BookLayout {
    /// Check line ranges and chapter numbers.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.chapters.is_empty() {
            return Err(LayoutError::NoChapters);
        }
        let mut seen = std::collections::BTreeSet::new();
        for ch in &self.chapters {
            if ch.start == 0 {
                return Err(LayoutError::ZeroStart { num: ch.num });
            }
            if let Some(end) = ch.end {
                if end < ch.start {
                    return Err(LayoutError::EndBeforeStart {
                        num: ch.num,
                        start: ch.start,
                        end,
                    });
                }
            }
            if !seen.insert(ch.num) {
                return Err(LayoutError::DuplicateChapter { num: ch.num });
            }
        }
        if let Some(ref a) = self.appendix {
            if a.start == 0 || a.end.is_some_and(|e| e < a.start) {
                return Err(LayoutError::InvalidAppendix {
                    start: a.start,
                    end: a.end,
                });
            }
        }
        Ok(())
    }

    pub fn running_header(&self) -> &str {
        if self.short_title.trim().is_empty() {
            &self.title
        } else {
            &self.short_title
        }
    }

    /// Chapter heading as printed in the book, e.g. `第3章：数字单词的密码破解`.
    pub fn chapter_heading(ch: &ChapterRange) -> String {
        format!("第{}章：{}", ch.num, ch.title)
    }
}

/// File name of a chapter inside the chapters directory.
pub fn chapter_file_name(num: u32) -> String {
    format!("chapter{:02}.html", num)
}

pub const APPENDIX_FILE: &str = "appendix.html";
pub const FRONT_COVER_FILE: &str = "book_cover.html";
pub const BACK_COVER_FILE: &str = "book_back_cover.html";
pub const CONTENTS_FILE: &str = "index.html";

/// Directory layout of one book project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub chapters_dir: PathBuf,
    pub images_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            chapters_dir: root.join("chapters"),
            images_dir: root.join("assets").join("images"),
            output_dir: root.join("output"),
            root,
        }
    }
}

/// One piece of the assembled book, in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookPart {
    FrontCover,
    /// Synthetic empty page so the contents and first chapter start on a right-hand page.
    BlankPage,
    Contents,
    Chapter(u32),
    Appendix,
    BackCover,
}

impl BookPart {
    /// Where this part lives on disk. Blank pages have no file.
    pub fn path(&self, paths: &ProjectPaths) -> Option<PathBuf> {
        match self {
            BookPart::FrontCover => Some(paths.root.join(FRONT_COVER_FILE)),
            BookPart::BackCover => Some(paths.root.join(BACK_COVER_FILE)),
            BookPart::Contents => Some(paths.root.join(CONTENTS_FILE)),
            BookPart::Chapter(n) => Some(paths.chapters_dir.join(chapter_file_name(*n))),
            BookPart::Appendix => Some(paths.chapters_dir.join(APPENDIX_FILE)),
            BookPart::BlankPage => None,
        }
    }

    pub fn is_cover(&self) -> bool {
        matches!(self, BookPart::FrontCover | BookPart::BackCover)
    }

    /// Short name for log lines.
    pub fn label(&self) -> String {
        match self {
            BookPart::FrontCover => FRONT_COVER_FILE.to_string(),
            BookPart::BackCover => BACK_COVER_FILE.to_string(),
            BookPart::Contents => CONTENTS_FILE.to_string(),
            BookPart::Chapter(n) => chapter_file_name(*n),
            BookPart::Appendix => APPENDIX_FILE.to_string(),
            BookPart::BlankPage => "blank page".to_string(),
        }
    }
}

/// Reading order for the print edition: covers, contents, chapters, appendix.
pub fn print_sequence(layout: &BookLayout) -> Vec<BookPart> {
    let mut parts = vec![BookPart::FrontCover, BookPart::Contents];
    parts.extend(layout.chapters.iter().map(|c| BookPart::Chapter(c.num)));
    if layout.appendix.is_some() {
        parts.push(BookPart::Appendix);
    }
    parts.push(BookPart::BackCover);
    parts
}

/// Reading order for the duplex PDF: blank pages keep the contents and chapter one on right-hand pages.
pub fn pdf_sequence(layout: &BookLayout) -> Vec<BookPart> {
    let mut parts = vec![
        BookPart::FrontCover,
        BookPart::BlankPage,
        BookPart::Contents,
        BookPart::BlankPage,
    ];
    parts.extend(layout.chapters.iter().map(|c| BookPart::Chapter(c.num)));
    if layout.appendix.is_some() {
        parts.push(BookPart::Appendix);
    }
    parts.push(BookPart::BackCover);
    parts
}

/// Turn a title into something safe to use as a file name (path separators and control characters removed).
pub fn file_stem_for(title: &str) -> String {
    let s: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    let s = s.trim().trim_matches('-').to_string();
    if s.is_empty() {
        "book".to_string()
    } else {
        s
    }
}

/// Join a relative path onto a base, used for manuscript resolution.
pub fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
