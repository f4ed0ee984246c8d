//! Client-side TCP networking
//!
//! This module provides hostname resolution, outbound TCP connections with
//! ordered fallback across resolved addresses, and blocking byte I/O with
//! millisecond timeouts. OS failure codes are classified at the call site
//! that observed them and surface as one of the semantic [`Error`] kinds;
//! raw codes are only carried inside the catch-all variants.

pub mod addr;
pub mod client;
pub(crate) mod poll;
pub mod resolver;
pub mod runtime;
pub mod tcp;

pub use addr::{AddrFamily, ResolvedAddr};
pub use client::SocketClient;
pub use resolver::resolve;
pub use runtime::RuntimeHandle;
pub use tcp::TcpClient;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Network operation errors
///
/// Callers are expected to match on the kind, never on an OS code. The only
/// variants that expose a code are [`Error::SystemFailure`], the catch-all
/// for unclassified OS failures, and [`Error::RetryUnsupported`], which
/// reports a would-block condition this crate deliberately does not retry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied value violates a precondition: empty hostname,
    /// port zero, a malformed address, or connecting a client that already
    /// holds a socket.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Name resolution failed permanently for this hostname. Retrying with
    /// the same input is not expected to help.
    #[error("name resolution failed: {0}")]
    ResolutionFailure(String),

    /// The target rejected the connection or was unreachable. Another
    /// candidate address may still succeed.
    #[error("connection failed: {0}")]
    ConnectionFailure(String),

    /// An operation was invoked on a client not in the required state,
    /// e.g. send before connect or receive after close.
    #[error("socket not set up: {0}")]
    SetupError(String),

    /// An established connection was severed by the peer or the network.
    #[error("socket disconnected: {0}")]
    SocketDisconnection(String),

    /// Data exceeded an OS stream or buffer limit.
    #[error("size limit exceeded: {0}")]
    Overflow(String),

    /// The local network interface was reported down while waiting for
    /// readiness.
    #[error("local network is down")]
    LinkDown,

    /// The OS reported a would-block or operation-in-progress condition.
    /// Retry semantics are deliberately undefined, so this fails loudly
    /// instead of looping.
    #[error("operation in progress; retry is not supported (os error {0})")]
    RetryUnsupported(i32),

    /// Any other OS-level failure, with the original code and message kept
    /// for diagnosis.
    #[error("system error {code}: {message}")]
    SystemFailure {
        /// Raw OS error code, 0 if the OS did not report one.
        code: i32,
        /// Human-readable message for the code.
        message: String,
    },
}

impl Error {
    /// Wraps an unclassified OS failure, keeping its code and display text.
    pub(crate) fn system(err: std::io::Error) -> Self {
        Error::SystemFailure {
            code: err.raw_os_error().unwrap_or(0),
            message: err.to_string(),
        }
    }
}
