//! Page synchronization with an external viewer.
//!
//! After every page change the current page number is written to a named
//! pipe as a decimal number followed by a newline. A PDF viewer reading the
//! pipe turns to that page. There is no acknowledgment.
//!
//! When nobody reads the pipe, [`SubscriberPolicy`] decides whether publishing
//! waits for a reader or fails immediately.

#[cfg(unix)]
mod fifo;

#[cfg(unix)]
pub use fifo::FifoChannel;

use serde::{Deserialize, Serialize};

use crate::config::SyncSettings;
use crate::error::SyncError;

/// Behavior when no viewer has the pipe open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberPolicy {
    /// Wait for a reader, bounded by `sync.timeout_ms` if set.
    Block,
    /// Return [`SyncError::NoSubscriber`] right away.
    #[default]
    FailFast,
}

/// A one-directional channel announcing the current page.
pub trait PageSync {
    /// Announces that `page` is now showing.
    fn publish(&mut self, page: usize) -> Result<(), SyncError>;

    /// Releases the channel. Further publishes are not expected.
    fn close(&mut self) {}
}

impl<T: PageSync + ?Sized> PageSync for Box<T> {
    fn publish(&mut self, page: usize) -> Result<(), SyncError> {
        (**self).publish(page)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// A channel that discards every page, used when no pipe is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSync;

impl PageSync for NullSync {
    fn publish(&mut self, _page: usize) -> Result<(), SyncError> {
        Ok(())
    }
}

/// The wire format of one page announcement.
pub fn frame(page: usize) -> String {
    format!("{}\n", page)
}

/// Opens the channel described by `settings`.
///
/// Without a configured path this is a [`NullSync`].
pub fn open(settings: &SyncSettings) -> Result<Box<dyn PageSync>, SyncError> {
    match &settings.path {
        None => Ok(Box::new(NullSync)),
        Some(path) => open_fifo(path.clone(), settings),
    }
}

#[cfg(unix)]
fn open_fifo(
    path: std::path::PathBuf,
    settings: &SyncSettings,
) -> Result<Box<dyn PageSync>, SyncError> {
    Ok(Box::new(FifoChannel::open(
        path,
        settings.subscriber,
        settings.timeout,
    )?))
}

#[cfg(not(unix))]
fn open_fifo(
    _path: std::path::PathBuf,
    _settings: &SyncSettings,
) -> Result<Box<dyn PageSync>, SyncError> {
    Err(SyncError::Unsupported)
}
