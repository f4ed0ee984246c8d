//! TCP client transport
//!
//! [`TcpClient`] owns at most one OS socket and walks a small lifecycle:
//! it starts idle, connects at most once, and once closed it stays closed —
//! reconnecting means creating a fresh instance. Every operation serializes
//! on one per-instance lock, so a client can be shared across threads while
//! each call runs alone.
//!
//! Blocking is always bounded: receive/peek wait at most the caller's
//! timeout for readiness, then issue exactly one OS call that is already
//! known not to block.

use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddr;
use std::os::fd::AsRawFd;
use std::sync::{Mutex, MutexGuard};

use socket2::{Protocol, SockAddr, Socket, Type};
use tracing::{debug, info, trace, warn};

use super::poll::wait_readable;
use super::{Error, ResolvedAddr, Result, RuntimeHandle, SocketClient};

#[derive(Debug)]
enum State {
    /// No socket allocated yet; connect is permitted.
    Idle,
    /// Socket allocated and connected.
    Connected(Conn),
    /// Terminal; the instance cannot be reused.
    Closed,
}

#[derive(Debug)]
struct Conn {
    // The socket is declared before the runtime handle so it closes first
    // when the connection is dropped.
    socket: Socket,
    peer: SocketAddr,
    _runtime: RuntimeHandle,
}

/// Blocking TCP client for outbound connections.
///
/// ```no_run
/// use tcplink::net::{resolve, TcpClient};
///
/// # fn main() -> tcplink::net::Result<()> {
/// let client = TcpClient::new();
/// client.connect_any(&resolve("www.example.com", 80)?)?;
///
/// client.send(b"ping")?;
/// let reply = client.receive(1024, 5000)?;
/// # Ok(())
/// # }
/// ```
///
/// Until `connect` succeeds, every data operation fails with
/// [`Error::SetupError`]. After [`close`](TcpClient::close) the client
/// behaves the same way, and a new `connect` is refused: create a fresh
/// instance to reconnect.
#[derive(Debug)]
pub struct TcpClient {
    state: Mutex<State>,
}

impl Default for TcpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpClient {
    /// Creates an unconnected client.
    pub fn new() -> Self {
        TcpClient {
            state: Mutex::new(State::Idle),
        }
    }

    /// Connects to a single resolved endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the client already holds a socket, has
    ///   been closed, or the address bytes are malformed.
    /// - [`Error::ConnectionFailure`] if the target rejected the connection
    ///   or was unreachable.
    /// - [`Error::SystemFailure`] for unclassified OS failures.
    ///
    /// No socket is left allocated on failure.
    pub fn connect(&self, addr: &ResolvedAddr) -> Result<()> {
        let mut state = self.lock();
        ensure_connectable(&state)?;

        let conn = open_connection(addr)?;
        info!(peer = %conn.peer, "connection established");
        *state = State::Connected(conn);
        Ok(())
    }

    /// Connects to the first reachable endpoint of an ordered list.
    ///
    /// Candidates are tried strictly in input order. Only
    /// [`Error::ConnectionFailure`] moves on to the next candidate; any
    /// other failure aborts the whole attempt immediately. If every
    /// candidate fails with a connection failure, one
    /// [`Error::ConnectionFailure`] is returned. An empty list is an
    /// [`Error::InvalidInput`].
    pub fn connect_any(&self, addrs: &[ResolvedAddr]) -> Result<()> {
        let mut state = self.lock();
        ensure_connectable(&state)?;

        if addrs.is_empty() {
            return Err(Error::InvalidInput(
                "no addresses to connect to".to_string(),
            ));
        }

        for addr in addrs {
            match open_connection(addr) {
                Ok(conn) => {
                    info!(peer = %conn.peer, "connection established");
                    *state = State::Connected(conn);
                    return Ok(());
                }
                Err(Error::ConnectionFailure(reason)) => {
                    debug!(%addr, reason = %reason, "candidate unreachable, trying next");
                }
                Err(other) => return Err(other),
            }
        }

        Err(Error::ConnectionFailure(
            "no candidate address accepted the connection".to_string(),
        ))
    }

    /// Closes the connection, releasing the socket.
    ///
    /// Never fails and is idempotent: closing an unconnected or already
    /// closed client does nothing. OS-level close errors are swallowed.
    pub fn close(&self) {
        let mut state = self.lock();
        if let State::Connected(conn) = &*state {
            debug!(peer = %conn.peer, "closing connection");
            *state = State::Closed;
        }
    }

    /// Checks whether the connection is still established.
    ///
    /// Peer shutdown and severed-connection conditions report `Ok(false)`;
    /// only unclassified OS failures surface as errors.
    pub fn connected(&self) -> Result<bool> {
        self.with_conn(check_connected)
    }

    /// Number of bytes ready to read without blocking.
    pub fn bytes_available(&self) -> Result<usize> {
        self.with_conn(pending_bytes)
    }

    /// Sends bytes, returning the count the OS accepted.
    ///
    /// Exactly one OS send is issued; a partial count is returned as-is.
    pub fn send(&self, buf: &[u8]) -> Result<usize> {
        self.with_conn(|conn| {
            let sent = conn.socket.send(buf).map_err(classify_stream_error)?;
            trace!(len = sent, peer = %conn.peer, "sent bytes");
            Ok(sent)
        })
    }

    /// Receives up to `max_size` bytes, waiting up to `timeout_ms`.
    ///
    /// Returns an empty buffer when no data arrived in time. A graceful
    /// close by the peer is reported as [`Error::SocketDisconnection`].
    pub fn receive(&self, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        self.with_conn(|conn| read_bytes(conn, max_size, timeout_ms, false))
    }

    /// Like [`receive`](TcpClient::receive), but non-consuming: the
    /// returned bytes remain available to the next receive or peek.
    pub fn peek(&self, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        self.with_conn(|conn| read_bytes(conn, max_size, timeout_ms, true))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("transport lock poisoned")
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Conn) -> Result<T>) -> Result<T> {
        let state = self.lock();
        match &*state {
            State::Connected(conn) => op(conn),
            State::Idle | State::Closed => Err(Error::SetupError(
                "client is not connected".to_string(),
            )),
        }
    }
}

impl SocketClient for TcpClient {
    fn connected(&self) -> Result<bool> {
        self.connected()
    }

    fn bytes_available(&self) -> Result<usize> {
        self.bytes_available()
    }

    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.send(buf)
    }

    fn receive(&self, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        self.receive(max_size, timeout_ms)
    }

    fn peek(&self, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        self.peek(max_size, timeout_ms)
    }
}

fn ensure_connectable(state: &State) -> Result<()> {
    match state {
        State::Idle => Ok(()),
        State::Connected(_) => Err(Error::InvalidInput(
            "client already holds a connection".to_string(),
        )),
        State::Closed => Err(Error::InvalidInput(
            "closed clients cannot reconnect; create a new client".to_string(),
        )),
    }
}

fn open_connection(addr: &ResolvedAddr) -> Result<Conn> {
    let peer = addr.to_socket_addr()?;
    let runtime = RuntimeHandle::acquire()?;
    let socket = Socket::new(addr.family().domain(), Type::STREAM, Some(Protocol::TCP))
        .map_err(Error::system)?;

    debug!(%peer, family = %addr.family(), "connecting");
    socket
        .connect(&SockAddr::from(peer))
        .map_err(classify_connect_error)?;

    Ok(Conn {
        socket,
        peer,
        _runtime: runtime,
    })
}

// Connect failures that another candidate address might not hit are
// connection failures; blame-the-caller codes are invalid input.
fn classify_connect_error(err: io::Error) -> Error {
    match err.raw_os_error() {
        Some(
            libc::ENETDOWN
            | libc::EADDRINUSE
            | libc::EINTR
            | libc::EINPROGRESS
            | libc::EALREADY
            | libc::EADDRNOTAVAIL
            | libc::ECONNREFUSED
            | libc::ENETUNREACH
            | libc::EHOSTUNREACH
            | libc::ETIMEDOUT,
        ) => Error::ConnectionFailure(err.to_string()),
        Some(libc::EAFNOSUPPORT | libc::EFAULT | libc::EINVAL) => {
            Error::InvalidInput(err.to_string())
        }
        Some(code @ libc::EWOULDBLOCK) => Error::RetryUnsupported(code),
        _ => Error::system(err),
    }
}

// Failure codes shared by send and receive on an established stream.
fn classify_stream_error(err: io::Error) -> Error {
    match err.raw_os_error() {
        Some(
            libc::ENETDOWN
            | libc::ENETRESET
            | libc::ENOTCONN
            | libc::EHOSTUNREACH
            | libc::ECONNABORTED
            | libc::ECONNRESET
            | libc::ETIMEDOUT
            | libc::EPIPE,
        ) => Error::SocketDisconnection(err.to_string()),
        Some(libc::EMSGSIZE) => Error::Overflow(err.to_string()),
        Some(code @ libc::EWOULDBLOCK) => Error::RetryUnsupported(code),
        _ => Error::system(err),
    }
}

fn check_connected(conn: &Conn) -> Result<bool> {
    match wait_readable(conn.socket.as_raw_fd(), 0) {
        // A downed link means nothing is connected either way.
        Err(Error::LinkDown) => return Ok(false),
        Err(err) => return Err(err),
        Ok(false) => return confirm_no_pending_error(conn),
        Ok(true) => {}
    }

    // Readable: either data or an end-of-stream marker is pending. A
    // non-consuming one-byte probe distinguishes the two.
    let mut probe = [MaybeUninit::<u8>::uninit()];
    match conn.socket.peek(&mut probe) {
        Ok(0) => Ok(false),
        Ok(_) => Ok(true),
        Err(err) => match err.raw_os_error() {
            Some(
                libc::ENETDOWN
                | libc::ENOTCONN
                | libc::ENETRESET
                | libc::ECONNABORTED
                | libc::ETIMEDOUT
                | libc::ECONNRESET,
            ) => Ok(false),
            Some(code @ (libc::EWOULDBLOCK | libc::EINPROGRESS)) => {
                Err(Error::RetryUnsupported(code))
            }
            _ => Err(Error::system(err)),
        },
    }
}

// Nothing was readable; the connection is presumed open only if the OS
// reports no pending error on the socket.
fn confirm_no_pending_error(conn: &Conn) -> Result<bool> {
    match conn.socket.take_error() {
        Ok(None) => Ok(true),
        Ok(Some(pending)) => {
            warn!(peer = %conn.peer, error = %pending, "pending socket error");
            Ok(false)
        }
        Err(err) => match err.raw_os_error() {
            Some(libc::ENETDOWN) => Ok(false),
            Some(code @ libc::EINPROGRESS) => Err(Error::RetryUnsupported(code)),
            _ => Err(Error::system(err)),
        },
    }
}

fn pending_bytes(conn: &Conn) -> Result<usize> {
    if !wait_readable(conn.socket.as_raw_fd(), 0)? {
        return Ok(0);
    }

    let mut count: libc::c_int = 0;
    let rc = unsafe { libc::ioctl(conn.socket.as_raw_fd(), libc::FIONREAD as _, &mut count) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        return Err(match err.raw_os_error() {
            Some(libc::ENETDOWN) => Error::SocketDisconnection(err.to_string()),
            Some(code @ libc::EINPROGRESS) => Error::RetryUnsupported(code),
            _ => Error::system(err),
        });
    }

    Ok(count.max(0) as usize)
}

fn read_bytes(conn: &Conn, max_size: usize, timeout_ms: u64, peek: bool) -> Result<Vec<u8>> {
    if !wait_readable(conn.socket.as_raw_fd(), timeout_ms)? {
        return Ok(Vec::new());
    }

    let mut buf: Vec<u8> = Vec::with_capacity(max_size);
    let result = if peek {
        conn.socket.peek(buf.spare_capacity_mut())
    } else {
        conn.socket.recv(buf.spare_capacity_mut())
    };
    let got = result.map_err(classify_stream_error)?;

    // A zero-byte read on a readable socket is the OS's way of reporting
    // that the peer shut the stream down.
    if got == 0 && max_size != 0 {
        info!(peer = %conn.peer, "peer closed the connection");
        return Err(Error::SocketDisconnection(
            "peer closed the connection".to_string(),
        ));
    }

    // SAFETY: the OS wrote `got` bytes into the spare capacity.
    unsafe { buf.set_len(got) };
    trace!(len = got, peek, peer = %conn.peer, "read bytes");
    Ok(buf)
}
