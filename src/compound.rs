//! Compound request composition (§4.2, C2).
//!
//! `CompoundArgs<'a>` borrows everything it references — path components, file handle bytes —
//! from buffers the caller owns, with the lifetime `'a` tying the whole array to them. This is
//! the idiomatic replacement for the original's manual "array and path buffer released
//! together, after submit" discipline (`SPEC_FULL.md` §9): the borrow checker rejects any
//! attempt to retain a `CompoundArgs` past the buffers it points into.

use crate::handle::FileHandle;
use crate::path;

/// `bitmap4`: the set of `fattr4` attributes a `GETATTR` requests, as the two 32-bit words
/// defined by RFC 7530 §3.3.4 (bit `n` lives in word `n / 32` at position `n % 32`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bitmap(pub [u32; 2]);

/// NFSv4 attribute bit numbers this core recognizes (RFC 7530 §5).
pub mod fattr4 {
    pub const SUPPORTED_ATTRS: u32 = 0;
    pub const TYPE: u32 = 1;
    pub const SIZE: u32 = 4;
    pub const FILEID: u32 = 20;
    pub const MODE: u32 = 33;
    pub const NUMLINKS: u32 = 35;
    pub const OWNER: u32 = 36;
    pub const OWNER_GROUP: u32 = 37;
    pub const SPACE_USED: u32 = 45;
    pub const TIME_ACCESS: u32 = 47;
    pub const TIME_METADATA: u32 = 52;
    pub const TIME_MODIFY: u32 = 53;
}

impl Bitmap {
    fn from_bits(bits: &[u32]) -> Self {
        let mut words = [0u32; 2];
        for &bit in bits {
            words[(bit / 32) as usize] |= 1 << (bit % 32);
        }
        Bitmap(words)
    }

    /// Returns `true` if bit `n` is set.
    pub fn has(&self, bit: u32) -> bool {
        self.0[(bit / 32) as usize] & (1 << (bit % 32)) != 0
    }

    /// The fixed bitmap the `stat` operation requests (§4.3).
    pub fn stat() -> Self {
        use fattr4::*;
        Self::from_bits(&[
            TYPE,
            SIZE,
            FILEID,
            MODE,
            NUMLINKS,
            OWNER,
            OWNER_GROUP,
            SPACE_USED,
            TIME_ACCESS,
            TIME_METADATA,
            TIME_MODIFY,
        ])
    }

    /// The single-bit bitmap the mount handshake's liveness-probe `GETATTR` requests.
    pub fn supported_attrs() -> Self {
        Self::from_bits(&[fattr4::SUPPORTED_ATTRS])
    }

    /// Iterates the set bits in ascending order, the order attributes appear on the wire.
    pub fn iter_ascending(&self) -> impl Iterator<Item = u32> + '_ {
        (0u32..64).filter(move |&bit| self.has(bit))
    }
}

/// A single NFSv4 `SETCLIENTID` argument (§4.5).
#[derive(Clone, Copy, Debug)]
pub struct SetClientIdArgs<'a> {
    pub verifier: [u8; 8],
    pub id: &'a str,
    pub callback_program: u32,
    pub callback_netid: &'a str,
    pub callback_addr: &'a str,
    pub callback_ident: u32,
}

/// A single NFSv4 `SETCLIENTID_CONFIRM` argument.
#[derive(Clone, Copy, Debug)]
pub struct SetClientIdConfirmArgs {
    pub client_id: u64,
    pub confirm: [u8; 8],
}

/// One sub-operation in a `COMPOUND4` argument array, borrowing its payload with lifetime
/// `'a` from whatever buffer produced it.
#[derive(Clone, Copy, Debug)]
pub enum ArgOp<'a> {
    PutRootFh,
    PutFh(&'a FileHandle),
    Lookup(&'a str),
    GetFh,
    GetAttr(Bitmap),
    SetClientId(SetClientIdArgs<'a>),
    SetClientIdConfirm(SetClientIdConfirmArgs),
}

/// A borrowed, short-lived `COMPOUND4` argument array (§3).
#[derive(Clone, Debug, Default)]
pub struct CompoundArgs<'a> {
    pub ops: Vec<ArgOp<'a>>,
}

impl<'a> CompoundArgs<'a> {
    /// Builds the `PUTROOTFH`/`PUTFH` + `LOOKUP*` prefix of a compound anchored at either the
    /// server root (`root_or_handle: None`) or a previously obtained handle, then appends
    /// `extra` trailing operations (§4.2).
    ///
    /// `path` must be the normalized, absolute path to resolve; its components are borrowed,
    /// not copied, into the returned `ArgOp::Lookup` entries.
    pub fn build(
        root_or_handle: Option<&'a FileHandle>,
        path: &'a str,
        extra: impl IntoIterator<Item = ArgOp<'a>>,
    ) -> Self {
        let component_count = path::component_count(path);
        let extra = extra.into_iter();
        let mut ops = Vec::with_capacity(1 + component_count + extra.size_hint().0);

        ops.push(match root_or_handle {
            None => ArgOp::PutRootFh,
            Some(handle) => ArgOp::PutFh(handle),
        });
        ops.extend(path::split(path).map(ArgOp::Lookup));
        ops.extend(extra);

        CompoundArgs { ops }
    }
}
