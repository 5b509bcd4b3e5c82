//! Termination signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP only raise a flag. The front ends poll it
//! between commands and quit through the controller, so the `finalize` hook
//! still runs.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static TERMINATE: AtomicBool = AtomicBool::new(false);

/// The flag raised by the installed handlers.
pub fn flag() -> &'static AtomicBool {
    &TERMINATE
}

/// Returns true once a termination signal has been received.
pub fn termination_requested() -> bool {
    TERMINATE.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn handle(_signal: libc::c_int) {
    // Only async-signal-safe work here.
    TERMINATE.store(true, Ordering::SeqCst);
}

/// Installs the handlers.
#[cfg(unix)]
pub fn install() -> io::Result<()> {
    let handler: extern "C" fn(libc::c_int) = handle;
    for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
        // SAFETY: the handler only stores to an atomic.
        let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Installs the handlers. Other platforms rely on the front end's own
/// Ctrl-C handling.
#[cfg(not(unix))]
pub fn install() -> io::Result<()> {
    Ok(())
}
