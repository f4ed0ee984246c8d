//! Hostname resolution
//!
//! Resolves a `(hostname, port)` pair into an ordered list of
//! [`ResolvedAddr`] values via the OS resolver. The lookup asks for
//! stream-oriented endpoints of any family and keeps the OS's returned
//! order, which encodes its own protocol preference; no re-sorting happens
//! here.
//!
//! Resolution goes through `getaddrinfo` directly rather than
//! `ToSocketAddrs` because the failure classification needs the resolver's
//! error code, which the standard library discards.

use std::ffi::{CStr, CString};
use std::io;
use std::ptr;
use std::slice;

use tracing::debug;

use super::{AddrFamily, Error, ResolvedAddr, Result};

// glibc deprecated EAI_NODATA, so libc does not export it for every target.
#[cfg(any(target_os = "linux", target_os = "android"))]
const EAI_NODATA: libc::c_int = -5;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const EAI_NODATA: libc::c_int = 7;

/// Resolves a hostname and port to an ordered list of endpoints.
///
/// Accepts both IPv4 and IPv6 results; entries of any other family are
/// dropped. The returned list may be empty.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `hostname` is empty (or contains an interior
///   NUL) or `port` is zero; the OS resolver is never consulted for these.
/// - [`Error::ResolutionFailure`] when the resolver reports the name as
///   unknown or unrecoverable (host not found, no data, try again, no
///   recovery).
/// - [`Error::SystemFailure`] for any other resolver failure, carrying the
///   original code.
pub fn resolve(hostname: &str, port: u16) -> Result<Vec<ResolvedAddr>> {
    if hostname.is_empty() || port == 0 {
        return Err(Error::InvalidInput(
            "hostname must be non-empty and port must be non-zero".to_string(),
        ));
    }

    let host = CString::new(hostname)
        .map_err(|_| Error::InvalidInput("hostname contains an interior NUL byte".to_string()))?;
    let service = CString::new(port.to_string()).expect("port digits contain no NUL");

    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_protocol = 0;

    let mut list: *mut libc::addrinfo = ptr::null_mut();
    let rc = unsafe { libc::getaddrinfo(host.as_ptr(), service.as_ptr(), &hints, &mut list) };
    if rc != 0 {
        return Err(classify_resolver_error(rc));
    }

    // All entries should already be AF_INET or AF_INET6 given the hints,
    // but drop anything else rather than hand out an address the transport
    // cannot open a socket for.
    let mut addresses = Vec::new();
    let mut cursor = list;
    while !cursor.is_null() {
        let info = unsafe { &*cursor };
        let family = match info.ai_family {
            libc::AF_INET => Some(AddrFamily::V4),
            libc::AF_INET6 => Some(AddrFamily::V6),
            _ => None,
        };
        if let Some(family) = family {
            if !info.ai_addr.is_null() {
                let raw = unsafe {
                    slice::from_raw_parts(info.ai_addr.cast::<u8>(), info.ai_addrlen as usize)
                };
                addresses.push(ResolvedAddr::from_raw(family, raw.into()));
            }
        }
        cursor = info.ai_next;
    }
    unsafe { libc::freeaddrinfo(list) };

    debug!(host = hostname, port, count = addresses.len(), "resolved addresses");
    Ok(addresses)
}

fn classify_resolver_error(code: libc::c_int) -> Error {
    if code == libc::EAI_SYSTEM {
        return Error::system(io::Error::last_os_error());
    }
    match code {
        libc::EAI_NONAME | EAI_NODATA | libc::EAI_AGAIN | libc::EAI_FAIL => {
            Error::ResolutionFailure(resolver_message(code))
        }
        _ => Error::SystemFailure {
            code,
            message: resolver_message(code),
        },
    }
}

// Human-readable text for a resolver error code.
fn resolver_message(code: libc::c_int) -> String {
    let msg = unsafe { libc::gai_strerror(code) };
    if msg.is_null() {
        return format!("resolver error {}", code);
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}
