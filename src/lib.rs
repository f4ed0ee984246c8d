//! tcplink - a blocking client-side TCP transport
//!
//! This crate resolves hostnames to address lists, establishes outbound TCP
//! connections with ordered fallback across the resolved candidates, and
//! exposes byte-oriented send/receive/peek operations that block for at most
//! a caller-supplied timeout.
//!
//! Callers never touch OS address structures or raw error codes: addresses
//! are opaque [`ResolvedAddr`](net::ResolvedAddr) values and failures arrive
//! as one of the semantic kinds of [`net::Error`].
//!
//! ```no_run
//! use tcplink::net::{resolve, TcpClient};
//!
//! # fn main() -> tcplink::net::Result<()> {
//! let addrs = resolve("www.example.com", 80)?;
//!
//! let client = TcpClient::new();
//! client.connect_any(&addrs)?;
//!
//! client.send(b"GET / HTTP/1.1\r\nHost: www.example.com\r\n\r\n")?;
//!
//! // Wait up to 5 seconds for the reply.
//! let reply = client.receive(4096, 5000)?;
//! println!("{}", String::from_utf8_lossy(&reply));
//! # Ok(())
//! # }
//! ```

pub mod net;

pub use net::{resolve, AddrFamily, Error, ResolvedAddr, Result, RuntimeHandle, SocketClient, TcpClient};
