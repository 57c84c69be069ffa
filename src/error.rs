//! Error types surfaced by the mount/stat pipeline.
//!
//! Mirrors the distilled spec's error-kind table (§7): every failure the core can produce
//! collapses into one of a handful of caller-visible kinds, with `Protocol` carrying the raw
//! `nfsstat4` for anything that maps to neither a transport nor a decode failure.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Outcome the (out of scope) RPC transport reports for a submitted call, distinct from the
/// NFSv4 status carried *inside* a successful reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RpcFailure {
    /// The transport itself failed (connection reset, malformed reply, ...).
    Transport,
    /// The call was cancelled before a reply arrived.
    Cancelled,
    /// The call timed out before a reply arrived.
    TimedOut,
    /// The transport could not queue or serialize the compound (submit queue refusal /
    /// allocation failure at the transport layer).
    NoMemory,
}

/// Which of the two distinct RPC-layer interruptions produced an [`Error::Interrupted`] (§4.4:
/// the two cases carry different caller-visible messages even though they map to the same
/// error kind).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptReason {
    Cancelled,
    TimedOut,
}

/// `nfsstat4` as defined by RFC 7530 §13.1, restricted to the values this core can observe
/// while mounting and stat-ing (SETCLIENTID/SETCLIENTID_CONFIRM/PUTROOTFH/PUTFH/LOOKUP/GETFH/
/// GETATTR replies).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum Nfsstat4 {
    Ok = 0,
    Perm = 1,
    NoEnt = 2,
    Io = 5,
    NxIo = 6,
    Access = 13,
    Exist = 17,
    XDev = 18,
    NotDir = 20,
    IsDir = 21,
    Inval = 22,
    FBig = 27,
    NoSpc = 28,
    RoFs = 30,
    MLink = 31,
    NameTooLong = 63,
    NotEmpty = 66,
    DQuot = 69,
    Stale = 70,
    BadHandle = 10001,
    BadCookie = 10003,
    NotSupp = 10004,
    TooSmall = 10005,
    ServerFault = 10006,
    BadType = 10007,
    Delay = 10008,
    Same = 10009,
    Denied = 10010,
    Expired = 10011,
    Locked = 10012,
    Grace = 10013,
    FhExpired = 10014,
    ShareDenied = 10015,
    WrongSec = 10016,
    ClidInUse = 10017,
    Resource = 10018,
    MovedRef = 10019,
    NoFileHandle = 10020,
    MinorVersMismatch = 10021,
    StaleClientId = 10022,
    StaleStateId = 10023,
    OldStateId = 10024,
    BadStateId = 10025,
    BadSeqid = 10026,
    NotSame = 10027,
    LockRange = 10028,
    SymLink = 10029,
    ReadDirOnly = 10030,
    LeaseMoved = 10031,
    AttrNotSupp = 10032,
    NoGrace = 10033,
    ReclaimBad = 10034,
    ReclaimConflict = 10035,
    BadXdr = 10036,
    LocksHeld = 10037,
    OpenMode = 10038,
    BadOwner = 10039,
    BadChar = 10040,
    BadName = 10041,
    BadRange = 10042,
    LockNotSupp = 10043,
    OpIllegal = 10044,
    LockSeqid = 10045,
    BadNoChange = 10046,
    BadRequest = 10047,
}

impl Nfsstat4 {
    /// Parses the raw wire value, rejecting anything outside the set this core recognizes.
    pub fn from_wire(value: u32) -> Option<Self> {
        FromPrimitive::from_u32(value)
    }

    fn name(self) -> &'static str {
        use Nfsstat4::*;
        match self {
            Ok => "NFS4_OK",
            Perm => "NFS4ERR_PERM",
            NoEnt => "NFS4ERR_NOENT",
            Io => "NFS4ERR_IO",
            NxIo => "NFS4ERR_NXIO",
            Access => "NFS4ERR_ACCESS",
            Exist => "NFS4ERR_EXIST",
            XDev => "NFS4ERR_XDEV",
            NotDir => "NFS4ERR_NOTDIR",
            IsDir => "NFS4ERR_ISDIR",
            Inval => "NFS4ERR_INVAL",
            FBig => "NFS4ERR_FBIG",
            NoSpc => "NFS4ERR_NOSPC",
            RoFs => "NFS4ERR_ROFS",
            MLink => "NFS4ERR_MLINK",
            NameTooLong => "NFS4ERR_NAMETOOLONG",
            NotEmpty => "NFS4ERR_NOTEMPTY",
            DQuot => "NFS4ERR_DQUOT",
            Stale => "NFS4ERR_STALE",
            BadHandle => "NFS4ERR_BADHANDLE",
            BadCookie => "NFS4ERR_BAD_COOKIE",
            NotSupp => "NFS4ERR_NOTSUPP",
            TooSmall => "NFS4ERR_TOOSMALL",
            ServerFault => "NFS4ERR_SERVERFAULT",
            BadType => "NFS4ERR_BADTYPE",
            Delay => "NFS4ERR_DELAY",
            Same => "NFS4ERR_SAME",
            Denied => "NFS4ERR_DENIED",
            Expired => "NFS4ERR_EXPIRED",
            Locked => "NFS4ERR_LOCKED",
            Grace => "NFS4ERR_GRACE",
            FhExpired => "NFS4ERR_FHEXPIRED",
            ShareDenied => "NFS4ERR_SHARE_DENIED",
            WrongSec => "NFS4ERR_WRONGSEC",
            ClidInUse => "NFS4ERR_CLID_INUSE",
            Resource => "NFS4ERR_RESOURCE",
            MovedRef => "NFS4ERR_MOVED",
            NoFileHandle => "NFS4ERR_NOFILEHANDLE",
            MinorVersMismatch => "NFS4ERR_MINOR_VERS_MISMATCH",
            StaleClientId => "NFS4ERR_STALE_CLIENTID",
            StaleStateId => "NFS4ERR_STALE_STATEID",
            OldStateId => "NFS4ERR_OLD_STATEID",
            BadStateId => "NFS4ERR_BAD_STATEID",
            BadSeqid => "NFS4ERR_BAD_SEQID",
            NotSame => "NFS4ERR_NOT_SAME",
            LockRange => "NFS4ERR_LOCK_RANGE",
            SymLink => "NFS4ERR_SYMLINK",
            ReadDirOnly => "NFS4ERR_READDIR_NOSPC",
            LeaseMoved => "NFS4ERR_LEASE_MOVED",
            AttrNotSupp => "NFS4ERR_ATTRNOTSUPP",
            NoGrace => "NFS4ERR_NO_GRACE",
            ReclaimBad => "NFS4ERR_RECLAIM_BAD",
            ReclaimConflict => "NFS4ERR_RECLAIM_CONFLICT",
            BadXdr => "NFS4ERR_BADXDR",
            LocksHeld => "NFS4ERR_LOCKS_HELD",
            OpenMode => "NFS4ERR_OPENMODE",
            BadOwner => "NFS4ERR_BADOWNER",
            BadChar => "NFS4ERR_BADCHAR",
            BadName => "NFS4ERR_BADNAME",
            BadRange => "NFS4ERR_BAD_RANGE",
            LockNotSupp => "NFS4ERR_LOCK_NOTSUPP",
            OpIllegal => "NFS4ERR_OP_ILLEGAL",
            LockSeqid => "NFS4ERR_LOCK_SEQID",
            BadNoChange => "NFS4ERR_BADNOCHANGE",
            BadRequest => "NFS4ERR_BADREQUEST",
        }
    }

    /// Negative-errno-class translation, matching the original's `nfsstat4_to_errno`.
    ///
    /// Values are the POSIX errno numbers (Linux x86_64 numbering); this core does not depend
    /// on `libc` just to name a dozen integer constants.
    fn errno(self) -> i32 {
        use Nfsstat4::*;
        -match self {
            Ok => 0,
            Perm => 1,                                                     // EPERM
            NoEnt => 2,                                                    // ENOENT
            Io => 5,                                                       // EIO
            NxIo => 6,                                                     // ENXIO
            Access | Denied | ShareDenied | LocksHeld | OpenMode | WrongSec => 13, // EACCES
            Exist | Same | NotSame => 17,                                  // EEXIST
            XDev => 18,                                                    // EXDEV
            NotDir => 20,                                                  // ENOTDIR
            IsDir => 21,                                                   // EISDIR
            FBig => 27,                                                    // EFBIG
            NoSpc | ReadDirOnly => 28,                                     // ENOSPC
            RoFs => 30,                                                    // EROFS
            MLink => 31,                                                   // EMLINK
            NameTooLong | BadName => 36,                                   // ENAMETOOLONG
            NotEmpty => 39,                                                // ENOTEMPTY
            Locked | LockRange | LockSeqid | LockNotSupp => 37,            // ENOLCK
            DQuot => 122,                                                  // EDQUOT
            Stale | StaleClientId | StaleStateId | FhExpired | BadHandle | NoFileHandle => 116, // ESTALE
            Delay | Grace | NoGrace => 11,                                 // EAGAIN
            SymLink => 40,                                                 // ELOOP
            BadXdr | OpIllegal | BadRequest => 71,                         // EPROTO
            _ => 22,                                                       // EINVAL
        }
    }
}

impl fmt::Display for Nfsstat4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u32)
    }
}

/// Errors surfaced by [`crate::context::Context::mount`] and [`crate::context::Context::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The transport could not queue or serialize the compound.
    NoMemory,
    /// The RPC layer reported a transport error.
    Fault,
    /// The call was cancelled or timed out; the reason gives the caller-visible message.
    Interrupted(InterruptReason),
    /// A reply was malformed: a short/overlong attribute blob, a missing expected result, or
    /// an unparseable owner/group.
    InvalidData(String),
    /// `stat` (or another post-mount operation) was attempted before `mount` succeeded.
    NotMounted,
    /// The compound's top-level status was a non-`NFS4_OK` `nfsstat4`.
    Protocol(Nfsstat4),
}

impl Error {
    /// Negative-errno-class value, for callers bridging to the C ABI convention described in
    /// the distilled spec's error handling section.
    pub fn errno(&self) -> i32 {
        match self {
            Error::NoMemory => -12,
            Error::Fault => -14,
            Error::Interrupted(_) => -4,
            Error::InvalidData(_) => -22,
            Error::NotMounted => -22,
            Error::Protocol(status) => status.errno(),
        }
    }
}

impl From<RpcFailure> for Error {
    fn from(failure: RpcFailure) -> Self {
        match failure {
            RpcFailure::Transport => Error::Fault,
            RpcFailure::Cancelled => Error::Interrupted(InterruptReason::Cancelled),
            RpcFailure::TimedOut => Error::Interrupted(InterruptReason::TimedOut),
            RpcFailure::NoMemory => Error::NoMemory,
        }
    }
}

impl From<Nfsstat4> for Error {
    fn from(status: Nfsstat4) -> Self {
        Error::Protocol(status)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMemory => write!(f, "out of memory"),
            Error::Fault => write!(f, "RPC transport error"),
            Error::Interrupted(InterruptReason::Cancelled) => write!(f, "Command was cancelled"),
            Error::Interrupted(InterruptReason::TimedOut) => write!(f, "Command timed out"),
            Error::InvalidData(msg) => write!(f, "{msg}"),
            Error::NotMounted => write!(f, "operation attempted before mount completed"),
            Error::Protocol(status) => write!(f, "NFS4 operation failed with {status}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clid_in_use_message_has_name_and_number() {
        let status = Nfsstat4::from_wire(10017).unwrap();
        assert_eq!(status, Nfsstat4::ClidInUse);
        let rendered = format!("{status}");
        assert!(rendered.contains("NFS4ERR_CLID_INUSE"));
        assert!(rendered.contains("10017"));
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert!(Nfsstat4::from_wire(0xdead_beef).is_none());
    }

    #[test]
    fn rpc_failures_map_to_the_documented_kinds() {
        assert_eq!(Error::from(RpcFailure::Transport), Error::Fault);
        assert_eq!(
            Error::from(RpcFailure::Cancelled),
            Error::Interrupted(InterruptReason::Cancelled)
        );
        assert_eq!(
            Error::from(RpcFailure::TimedOut),
            Error::Interrupted(InterruptReason::TimedOut)
        );
        assert_eq!(Error::from(RpcFailure::NoMemory), Error::NoMemory);
    }

    #[test]
    fn cancelled_and_timed_out_have_distinct_messages() {
        assert_eq!(
            format!("{}", Error::Interrupted(InterruptReason::Cancelled)),
            "Command was cancelled"
        );
        assert_eq!(
            format!("{}", Error::Interrupted(InterruptReason::TimedOut)),
            "Command timed out"
        );
    }

    #[test]
    fn errno_values_match_the_spec_table() {
        assert_eq!(Error::NoMemory.errno(), -12);
        assert_eq!(Error::Fault.errno(), -14);
        assert_eq!(Error::Interrupted(InterruptReason::Cancelled).errno(), -4);
        assert_eq!(Error::InvalidData(String::new()).errno(), -22);
    }
}
