//! Logging setup for the binary.
//!
//! The interactive TUI owns the terminal, so it logs to a file. Every other
//! mode logs to stderr unless `--log-file` is given.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// The default log file used by the TUI.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("slidehook").join("slidehook.log"))
}

/// Maps the number of `-v` flags to a level. The default is `warn`.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initializes the global subscriber.
///
/// `RUST_LOG` overrides the verbosity. Returns the guard that must be kept
/// alive for file logging to flush.
pub fn init(verbosity: u8, log_file: Option<&Path>, tui: bool) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .from_env_lossy();

    let target = match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if tui => default_log_path(),
        None => None,
    };

    if let Some(path) = target {
        match file_writer(&path) {
            Some((writer, guard)) => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .init();
                return Some(guard);
            }
            // Stderr would draw over the TUI.
            None if tui => return None,
            None => {}
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    None
}

fn file_writer(
    path: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path.file_name()?;
    fs::create_dir_all(dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Some(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::TRACE);
    }

    #[test]
    fn test_default_log_path_is_under_cache_dir() {
        if let Some(path) = default_log_path() {
            assert!(path.ends_with("slidehook/slidehook.log"));
        }
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        assert!(file_writer(&path).is_some());
        assert!(dir.path().join("logs").is_dir());
    }
}
