//! The opaque NFSv4 file handle (§3).

use crate::error::Error;

/// Maximum length of an NFSv4 file handle, per RFC 7530 §3.3.5 (`NFS4_FHSIZE`).
pub const MAX_LEN: usize = 128;

/// An opaque, server-assigned file handle.
///
/// Immutable once obtained; the root handle is owned by [`crate::context::Context`] and
/// borrowed read-only by every `PUTFH` a compound builds against it (§5).
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle(Vec<u8>);

impl FileHandle {
    /// Takes ownership of `bytes` as a file handle, rejecting anything over [`MAX_LEN`].
    pub fn new(bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.len() > MAX_LEN {
            return Err(Error::InvalidData(format!(
                "file handle of {} bytes exceeds the {MAX_LEN}-byte limit",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileHandle({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_handles_up_to_the_limit() {
        assert!(FileHandle::new(vec![0u8; MAX_LEN]).is_ok());
    }

    #[test]
    fn rejects_oversized_handles() {
        assert!(FileHandle::new(vec![0u8; MAX_LEN + 1]).is_err());
    }
}
