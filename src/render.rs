//! HTML-to-PDF rendering. The actual layout engine is an external program; this module
//! stages the HTML, fills in the command line and checks the result.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "weasyprint";

/// Default arguments; `{base}`, `{input}` and `{output}` are substituted per call.
pub fn default_args() -> Vec<String> {
    ["--base-url", "{base}", "{input}", "{output}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Could not start PDF renderer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF renderer '{program}' failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Renderer reported success but {path} was not written.")]
    MissingOutput { path: PathBuf },

    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a complete HTML document into a PDF file.
pub trait PdfRenderer {
    /// `base_dir` is where relative URLs in `html` resolve.
    fn render(&self, html: &str, base_dir: &Path, output: &Path) -> Result<(), RenderError>;
}

/// Runs an external converter such as WeasyPrint.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    temp_dir: PathBuf,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            temp_dir: temp_dir.into(),
        }
    }
}

/// Substitute the path placeholders in each argument.
pub fn expand_args(args: &[String], base: &Path, input: &Path, output: &Path) -> Vec<String> {
    let base = base.display().to_string();
    let input = input.display().to_string();
    let output = output.display().to_string();
    args.iter()
        .map(|a| {
            a.replace("{base}", &base)
                .replace("{input}", &input)
                .replace("{output}", &output)
        })
        .collect()
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl PdfRenderer for CommandRenderer {
    fn render(&self, html: &str, base_dir: &Path, output: &Path) -> Result<(), RenderError> {
        std::fs::create_dir_all(&self.temp_dir).map_err(io_err(&self.temp_dir))?;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let staged = self.temp_dir.join(format!("{}.html", stem));
        std::fs::write(&staged, html).map_err(io_err(&staged))?;

        let args = expand_args(&self.args, base_dir, &staged, output);
        debug!("Running {} {:?}", self.program, args);
        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !result.status.success() {
            return Err(RenderError::Failed {
                program: self.program.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.exists() {
            return Err(RenderError::MissingOutput {
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }
}
