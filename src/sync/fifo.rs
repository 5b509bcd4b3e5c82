//! Named pipe (FIFO) page-sync channel.
//!
//! The write end is opened with `O_NONBLOCK`, which fails with `ENXIO` while
//! no reader has the pipe open. That is how a missing viewer is detected
//! without hanging the presentation at startup.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::{PageSync, SubscriberPolicy, frame};
use crate::error::SyncError;

/// How often a blocked publish retries opening the pipe.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// A page-sync channel backed by a named pipe.
#[derive(Debug)]
pub struct FifoChannel {
    path: PathBuf,
    policy: SubscriberPolicy,
    timeout: Option<Duration>,
    file: Option<File>,
    /// Whether this channel created the pipe and should remove it on close.
    created: bool,
}

impl FifoChannel {
    /// Opens the pipe at `path`, creating it if needed.
    ///
    /// Startup never waits for a viewer: if nobody is reading yet, the pipe
    /// is opened on the first publish instead.
    pub fn open(
        path: PathBuf,
        policy: SubscriberPolicy,
        timeout: Option<Duration>,
    ) -> Result<Self, SyncError> {
        let created = ensure_fifo(&path)?;
        let mut channel = Self {
            path,
            policy,
            timeout,
            file: None,
            created,
        };
        if channel.try_connect()? {
            debug!(path = %channel.path.display(), "viewer attached at startup");
        } else {
            debug!(path = %channel.path.display(), "no viewer attached yet");
        }
        Ok(channel)
    }

    /// Returns true if the write end is currently open.
    pub fn is_connected(&self) -> bool {
        self.file.is_some()
    }

    /// Opens the write end without waiting. Returns false when there is no reader.
    fn try_connect(&mut self) -> Result<bool, SyncError> {
        match OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
        {
            Ok(file) => {
                self.file = Some(file);
                Ok(true)
            }
            Err(e) if e.raw_os_error() == Some(libc::ENXIO) => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Opens the write end according to the subscriber policy.
    fn connect(&mut self, deadline: Option<Instant>) -> Result<(), SyncError> {
        if self.try_connect()? {
            return Ok(());
        }
        match (self.policy, deadline) {
            (SubscriberPolicy::FailFast, _) => Err(self.no_subscriber()),
            (SubscriberPolicy::Block, None) => loop {
                // Blocks until a reader opens the other end.
                match OpenOptions::new().write(true).open(&self.path) {
                    Ok(file) => {
                        self.file = Some(file);
                        return Ok(());
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(source) => return Err(self.io_error(source)),
                }
            },
            (SubscriberPolicy::Block, Some(deadline)) => loop {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return Err(self.timeout_error());
                }
                thread::sleep(RETRY_INTERVAL.min(left));
                if self.try_connect()? {
                    return Ok(());
                }
            },
        }
    }

    fn no_subscriber(&self) -> SyncError {
        SyncError::NoSubscriber {
            path: self.path.clone(),
        }
    }

    fn timeout_error(&self) -> SyncError {
        SyncError::Timeout {
            path: self.path.clone(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }

    fn io_error(&self, source: io::Error) -> SyncError {
        SyncError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PageSync for FifoChannel {
    fn publish(&mut self, page: usize) -> Result<(), SyncError> {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let frame = frame(page);

        // A second attempt covers a viewer that restarted since the last publish.
        for _ in 0..2 {
            if self.file.is_none() {
                self.connect(deadline)?;
            }
            let Some(file) = self.file.as_mut() else {
                return Err(self.no_subscriber());
            };
            match write_frame(file, frame.as_bytes(), deadline) {
                Ok(()) => {
                    trace!(page, path = %self.path.display(), "published page");
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!(path = %self.path.display(), "viewer closed the pipe");
                    self.file = None;
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Err(self.timeout_error());
                }
                Err(source) => return Err(self.io_error(source)),
            }
        }
        Err(self.no_subscriber())
    }

    fn close(&mut self) {
        self.file = None;
        if self.created {
            self.created = false;
            match fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "removed named pipe"),
                Err(e) => warn!(path = %self.path.display(), "failed to remove named pipe: {}", e),
            }
        }
    }
}

impl Drop for FifoChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Makes sure `path` is a FIFO. Returns true if it had to be created.
fn ensure_fifo(path: &Path) -> Result<bool, SyncError> {
    let io_error = |source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    };
    match fs::metadata(path) {
        Ok(metadata) if metadata.file_type().is_fifo() => Ok(false),
        Ok(_) => Err(SyncError::NotAFifo {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let c_path = CString::new(path.as_os_str().as_bytes())
                .map_err(|e| io_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
            // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
            if unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) } != 0 {
                return Err(io_error(io::Error::last_os_error()));
            }
            info!(path = %path.display(), "created named pipe");
            Ok(true)
        }
        Err(e) => Err(io_error(e)),
    }
}

/// Writes one frame, waiting for pipe capacity until `deadline`.
///
/// Expiry is reported as `ErrorKind::TimedOut`.
fn write_frame(file: &mut File, mut bytes: &[u8], deadline: Option<Instant>) -> io::Result<()> {
    while !bytes.is_empty() {
        match file.write(bytes) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => wait_writable(file, deadline)?,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Polls until the pipe accepts writes or `deadline` passes.
fn wait_writable(file: &File, deadline: Option<Instant>) -> io::Result<()> {
    loop {
        let timeout_ms: libc::c_int = match deadline {
            None => -1,
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return Err(io::ErrorKind::TimedOut.into());
                }
                left.as_millis().clamp(1, libc::c_int::MAX as u128) as libc::c_int
            }
        };
        let mut pollfd = libc::pollfd {
            fd: file.as_raw_fd(),
            events: libc::POLLOUT,
            revents: 0,
        };
        // SAFETY: pollfd is a single valid entry and the descriptor outlives the call.
        match unsafe { libc::poll(&mut pollfd, 1, timeout_ms) } {
            0 => return Err(io::ErrorKind::TimedOut.into()),
            n if n > 0 => return Ok(()),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err);
                }
            }
        }
    }
}
