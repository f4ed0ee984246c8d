//! Resolved socket addresses
//!
//! This module provides [`ResolvedAddr`], an opaque, immutable network
//! endpoint produced by name resolution. The value keeps the OS's native
//! socket-address bytes together with the address family they belong to, so
//! callers can pass endpoints around and extract the textual IP or the port
//! without ever touching a `sockaddr` themselves.

use std::fmt;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::ptr;

use super::{Error, Result};

/// Address family of a resolved endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl AddrFamily {
    /// Byte size of this family's native socket-address structure.
    pub fn native_len(self) -> usize {
        match self {
            AddrFamily::V4 => mem::size_of::<libc::sockaddr_in>(),
            AddrFamily::V6 => mem::size_of::<libc::sockaddr_in6>(),
        }
    }

    pub(crate) fn domain(self) -> socket2::Domain {
        match self {
            AddrFamily::V4 => socket2::Domain::IPV4,
            AddrFamily::V6 => socket2::Domain::IPV6,
        }
    }
}

impl fmt::Display for AddrFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrFamily::V4 => write!(f, "IPv4"),
            AddrFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// An opaque resolved network endpoint.
///
/// Holds the native socket-address bytes exactly as the OS resolver returned
/// them, tagged with their address family. The stored byte length is expected
/// to match the family's native structure size; every consumer re-checks that
/// invariant and rejects a mismatch with [`Error::InvalidInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddr {
    family: AddrFamily,
    raw: Box<[u8]>,
}

impl ResolvedAddr {
    /// Wraps raw native socket-address bytes. The resolver is the only
    /// producer of addresses that did not start as a [`SocketAddr`].
    pub(crate) fn from_raw(family: AddrFamily, raw: Box<[u8]>) -> Self {
        ResolvedAddr { family, raw }
    }

    /// Creates a resolved address from a standard library socket address,
    /// bypassing name resolution.
    pub fn from_std(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => {
                let mut sin: libc::sockaddr_in = unsafe { mem::zeroed() };
                sin.sin_family = libc::AF_INET as libc::sa_family_t;
                sin.sin_port = v4.port().to_be();
                sin.sin_addr = libc::in_addr {
                    s_addr: u32::from(*v4.ip()).to_be(),
                };
                ResolvedAddr {
                    family: AddrFamily::V4,
                    raw: struct_bytes(&sin),
                }
            }
            SocketAddr::V6(v6) => {
                let mut sin6: libc::sockaddr_in6 = unsafe { mem::zeroed() };
                sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                sin6.sin6_port = v6.port().to_be();
                sin6.sin6_flowinfo = v6.flowinfo();
                sin6.sin6_addr = libc::in6_addr {
                    s6_addr: v6.ip().octets(),
                };
                sin6.sin6_scope_id = v6.scope_id();
                ResolvedAddr {
                    family: AddrFamily::V6,
                    raw: struct_bytes(&sin6),
                }
            }
        }
    }

    /// The address family this endpoint was resolved for.
    pub fn family(&self) -> AddrFamily {
        self.family
    }

    /// The textual IP address stored in this endpoint.
    ///
    /// Fails with [`Error::InvalidInput`] if the stored bytes do not match
    /// the declared family's native size.
    pub fn ip(&self) -> Result<IpAddr> {
        Ok(self.to_socket_addr()?.ip())
    }

    /// The port stored in this endpoint.
    ///
    /// Fails with [`Error::InvalidInput`] if the stored bytes do not match
    /// the declared family's native size.
    pub fn port(&self) -> Result<u16> {
        Ok(self.to_socket_addr()?.port())
    }

    /// Decodes the native bytes back into a standard socket address,
    /// re-checking the length invariant.
    pub(crate) fn to_socket_addr(&self) -> Result<SocketAddr> {
        let expected = self.family.native_len();
        if self.raw.len() != expected {
            return Err(Error::InvalidInput(format!(
                "malformed {} address: {} bytes, expected {}",
                self.family,
                self.raw.len(),
                expected
            )));
        }

        match self.family {
            AddrFamily::V4 => {
                // Length was checked against sizeof(sockaddr_in) above.
                let sin: libc::sockaddr_in =
                    unsafe { ptr::read_unaligned(self.raw.as_ptr().cast()) };
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                Ok(SocketAddr::V4(SocketAddrV4::new(
                    ip,
                    u16::from_be(sin.sin_port),
                )))
            }
            AddrFamily::V6 => {
                let sin6: libc::sockaddr_in6 =
                    unsafe { ptr::read_unaligned(self.raw.as_ptr().cast()) };
                let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                Ok(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    u16::from_be(sin6.sin6_port),
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                )))
            }
        }
    }
}

impl From<SocketAddr> for ResolvedAddr {
    fn from(addr: SocketAddr) -> Self {
        ResolvedAddr::from_std(addr)
    }
}

impl fmt::Display for ResolvedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_socket_addr() {
            Ok(addr) => write!(f, "{}", addr),
            Err(_) => write!(f, "<malformed {} address>", self.family),
        }
    }
}

// Copies a sockaddr struct into owned bytes.
fn struct_bytes<T>(value: &T) -> Box<[u8]> {
    let len = mem::size_of::<T>();
    let mut raw = vec![0u8; len];
    unsafe {
        ptr::copy_nonoverlapping((value as *const T).cast::<u8>(), raw.as_mut_ptr(), len);
    }
    raw.into_boxed_slice()
}
