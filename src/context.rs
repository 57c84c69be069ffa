//! The client context (§4.7, C7): mount-scoped state carried across every operation.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::handle::FileHandle;

/// Per-mount state: server/export identity, the resolved root handle, and the client
/// registration obtained during `SETCLIENTID`/`SETCLIENTID_CONFIRM` (§3).
pub struct Context {
    pub(crate) client_name: String,
    pub(crate) verifier: [u8; 8],
    pub(crate) server: Option<String>,
    pub(crate) cwd: String,
    pub(crate) root_fh: Option<FileHandle>,
    pub(crate) client_id: Option<u64>,
    pub(crate) setclientid_confirm: Option<[u8; 8]>,
    pub(crate) last_error: Option<String>,
}

/// Derives the 8-byte verifier the original describes as "fixed, random, identifies this
/// client instance across reboots" (§4.7). This crate's dependency set carries no RNG, so the
/// verifier is instead derived from the current time and process id — stable for the process's
/// lifetime, which is the property `SETCLIENTID` actually needs, if not cryptographically
/// random.
fn derive_verifier() -> [u8; 8] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let pid = std::process::id() as u64;
    let mixed = nanos ^ (pid << 32);
    mixed.to_be_bytes()
}

impl Context {
    /// Creates a context identifying itself to the server as `client_name`. No network activity
    /// occurs until [`Context::mount`] is called.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            verifier: derive_verifier(),
            server: None,
            cwd: "/".to_string(),
            root_fh: None,
            client_id: None,
            setclientid_confirm: None,
            last_error: None,
        }
    }

    /// The most recent error message recorded by the error mapper (§4.4). Advisory only; never
    /// consulted for control flow.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The root file handle obtained at mount, if any.
    pub fn root_fh(&self) -> Option<&FileHandle> {
        self.root_fh.as_ref()
    }

    /// `true` once the mount state machine has reached its terminal state.
    pub fn is_mounted(&self) -> bool {
        self.root_fh.is_some()
    }

    /// The current working directory `stat()` resolves relative paths against.
    pub fn cwd(&self) -> &str {
        &self.cwd
    }
}
