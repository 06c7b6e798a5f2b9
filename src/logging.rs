use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "bookpress=debug"
    } else if quiet {
        "bookpress=warn"
    } else {
        "bookpress=info"
    }
}

/// Install the global subscriber: compact stderr output, plus an optional append-only log file.
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init(verbose: bool, quiet: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_picks_directive() {
        assert_eq!(default_directive(false, false), "bookpress=info");
        assert_eq!(default_directive(true, false), "bookpress=debug");
        assert_eq!(default_directive(false, true), "bookpress=warn");
        assert_eq!(default_directive(true, true), "bookpress=debug");
    }

    #[test]
    fn creates_log_file_and_parents() {
        let dir = std::env::temp_dir().join(format!("bookpress_logging_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("logs").join("crawler.log");
        init(false, true, Some(&path)).unwrap();
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
