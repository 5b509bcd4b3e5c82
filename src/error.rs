//! Error types shared across the presentation pipeline.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::hooks::HookName;

/// Errors raised while reading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed TOML, an unknown key, or a value of the wrong type.
    #[error("configuration syntax error in {origin} at line {line}, column {column}: {message}")]
    Syntax {
        origin: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors raised by a single hook dispatch.
///
/// A non-zero exit status is not an error at this level; it is returned as
/// an [`ExitStatus`](crate::hooks::ExitStatus) and judged by the controller.
#[derive(Error, Debug)]
pub enum HookError {
    /// An argument template referenced a variable that has no binding.
    #[error("unbound variable `${{{token}}}` in {hook} hook")]
    UnboundVariable { hook: HookName, token: String },

    /// The binary could not be started at all.
    #[error("failed to launch `{binary}` for {hook} hook: {source}")]
    Launch {
        hook: HookName,
        binary: String,
        #[source]
        source: io::Error,
    },
}

/// Errors raised by the page-sync channel.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No viewer has the pipe open for reading.
    #[error("no viewer is reading {}", path.display())]
    NoSubscriber { path: PathBuf },

    /// The configured timeout elapsed while waiting for a reader or for pipe capacity.
    #[error("timed out after {timeout:?} writing to {}", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("{} exists but is not a named pipe", path.display())]
    NotAFifo { path: PathBuf },

    #[error("named pipes are not supported on this platform")]
    Unsupported,

    #[error("page sync I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors returned for a navigation command.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// The requested page does not exist. State is unchanged.
    #[error("page {requested} is out of range (1-{page_count})")]
    OutOfRange { requested: usize, page_count: usize },

    /// The presentation has already terminated.
    #[error("presentation has terminated")]
    Terminated,

    /// A hook failed under the `abort` failure policy. The presentation has been finalized.
    #[error("{hook} hook failed: {reason}")]
    HookFailed { hook: HookName, reason: String },
}

/// Errors that abort startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read presentation {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The initialize hook failed under the `abort` failure policy.
    #[error("{hook} hook failed: {reason}")]
    HookFailed { hook: HookName, reason: String },
}

/// A navigation command that could not be parsed.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown command `{0}` (try next, previous, first, last, goto N, quit)")]
pub struct ParseCommandError(pub String);
