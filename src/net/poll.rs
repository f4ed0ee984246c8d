//! Socket readiness polling
//!
//! Single-socket readable wait, the foundation of every blocking operation
//! in this crate. A timeout of `0` polls once without blocking.

use std::io;
use std::os::fd::RawFd;

use super::{Error, Result};

/// Waits until `fd` is readable or `timeout_ms` elapses.
///
/// Returns `Ok(true)` if the descriptor became readable and `Ok(false)` on
/// timeout. `ENETDOWN` maps to [`Error::LinkDown`]; an in-progress condition
/// fails loudly as [`Error::RetryUnsupported`]; anything else is a
/// [`Error::SystemFailure`].
pub(crate) fn wait_readable(fd: RawFd, timeout_ms: u64) -> Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    let timeout = timeout_ms.min(i32::MAX as u64) as libc::c_int;
    let rc = unsafe { libc::poll(&mut pfd, 1, timeout) };

    if rc < 0 {
        let err = io::Error::last_os_error();
        return Err(match err.raw_os_error() {
            Some(libc::ENETDOWN) => Error::LinkDown,
            Some(code @ libc::EINPROGRESS) => Error::RetryUnsupported(code),
            _ => Error::system(err),
        });
    }

    Ok(rc > 0)
}
