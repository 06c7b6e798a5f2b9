//! Clickable word cards: injects the pronunciation script, its on-screen guide and the
//! interactive `.word-card` style into chapter pages.

use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{error, info};

const SCRIPT_MARKER: &str = "word-pronunciation.js";
const WORD_CARD_CSS: &str = include_str!("templates/word_card.css");
const GUIDE_HTML: &str = include_str!("templates/pronunciation_guide.html");

fn word_card_rule() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.word-card\s*\{[^}]*\}").expect("static regex"))
}

/// Add the pronunciation feature to one page. Returns `None` when the page already has it.
pub fn add_pronunciation(html: &str) -> Option<String> {
    if html.contains(SCRIPT_MARKER) {
        return None;
    }
    let css = word_card_rule().replace_all(html, NoExpand(WORD_CARD_CSS.trim_start()));
    let out = match css.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &css[..pos], GUIDE_HTML, &css[pos..]),
        None => format!("{}{}", css, GUIDE_HTML),
    };
    Some(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PronounceOutcome {
    Added,
    AlreadyPresent,
    Failed(String),
}

/// Apply [`add_pronunciation`] to every `chapter*.html` in `chapters_dir`, in name order.
pub fn add_pronunciation_to_chapters(chapters_dir: &Path) -> std::io::Result<Vec<(PathBuf, PronounceOutcome)>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(chapters_dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("chapter") && n.ends_with(".html"))
        })
        .collect();
    files.sort();

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let outcome = match std::fs::read_to_string(&path) {
            Ok(html) => match add_pronunciation(&html) {
                None => PronounceOutcome::AlreadyPresent,
                Some(updated) => match std::fs::write(&path, updated) {
                    Ok(()) => PronounceOutcome::Added,
                    Err(e) => PronounceOutcome::Failed(e.to_string()),
                },
            },
            Err(e) => PronounceOutcome::Failed(e.to_string()),
        };
        match &outcome {
            PronounceOutcome::Added => info!("Added pronunciation to {}", path.display()),
            PronounceOutcome::AlreadyPresent => info!("{} already has pronunciation", path.display()),
            PronounceOutcome::Failed(e) => error!("Failed to update {}: {}", path.display(), e),
        }
        results.push((path, outcome));
    }
    Ok(results)
}
