//! Socket client capability interface
//!
//! [`SocketClient`] is the set of data operations every connected transport
//! in this crate offers. Connection establishment and shutdown stay on the
//! concrete types because their inputs differ per transport; once a client
//! is connected, code that only moves bytes can work against this trait.

use super::Result;

/// Byte-oriented operations on a connected socket client.
///
/// All methods require a prior successful connect and fail with
/// [`Error::SetupError`](super::Error::SetupError) otherwise. Calls on one
/// instance are mutually exclusive; each blocks any concurrent operation on
/// the same instance until it returns.
pub trait SocketClient {
    /// Checks whether the connection is still established.
    ///
    /// Peer-initiated shutdown and severed-network conditions report
    /// `Ok(false)` rather than an error.
    fn connected(&self) -> Result<bool>;

    /// Number of bytes currently available to read without blocking.
    fn bytes_available(&self) -> Result<usize>;

    /// Sends bytes over the connection, returning how many were accepted.
    ///
    /// A single OS send is issued; a short count is returned to the caller,
    /// not retried internally.
    fn send(&self, buf: &[u8]) -> Result<usize>;

    /// Receives up to `max_size` bytes, waiting up to `timeout_ms` for data.
    ///
    /// Returns an empty buffer if no data arrived in time; that is a normal
    /// outcome, not an error.
    fn receive(&self, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>>;

    /// Like [`receive`](Self::receive), but leaves the returned bytes
    /// available for the next receive or peek.
    fn peek(&self, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>>;
}
