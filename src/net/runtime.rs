//! Socket subsystem lifetime
//!
//! Some platforms require a process-wide startup call before any socket API
//! may be used, and a matching teardown once nothing needs sockets anymore.
//! [`RuntimeHandle`] tracks that lifetime with a reference count: the first
//! acquisition runs the startup hook, the last release runs teardown.
//! Ownership is explicit — every connected [`TcpClient`](super::TcpClient)
//! holds exactly one handle, released when the connection is closed or
//! dropped.
//!
//! On the Unix targets this crate supports, the hooks are empty because the
//! socket subsystem needs no explicit startup; the count is still kept so
//! that acquisition stays visible in the types that depend on it.

use std::sync::Mutex;

use tracing::debug;

use super::Result;

static HOLDERS: Mutex<usize> = Mutex::new(0);

/// A live claim on the process-wide socket subsystem.
///
/// Acquiring the first handle initializes the subsystem; dropping the last
/// one tears it down. Handles are not clonable — each owner acquires its
/// own.
#[derive(Debug)]
pub struct RuntimeHandle(());

impl RuntimeHandle {
    /// Claims the socket subsystem, initializing it if this is the first
    /// live claim in the process.
    pub fn acquire() -> Result<Self> {
        let mut holders = HOLDERS.lock().expect("runtime lock poisoned");
        if *holders == 0 {
            startup()?;
            debug!("socket subsystem initialized");
        }
        *holders += 1;
        Ok(RuntimeHandle(()))
    }

    /// Number of live claims in the process.
    pub fn holder_count() -> usize {
        *HOLDERS.lock().expect("runtime lock poisoned")
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        let mut holders = HOLDERS.lock().expect("runtime lock poisoned");
        *holders -= 1;
        if *holders == 0 {
            teardown();
            debug!("socket subsystem torn down");
        }
    }
}

// Platform hooks. Unix needs no process-wide socket startup.
fn startup() -> Result<()> {
    Ok(())
}

fn teardown() {}
