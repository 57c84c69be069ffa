//! An asynchronous NFSv4 client core: compound-request composition, the mount handshake, path
//! resolution, and `fattr4` attribute decoding.
//!
//! The RPC/XDR transport is out of scope and modeled by the [`transport::Transport`] trait;
//! this crate ships [`transport::loopback::LoopbackTransport`] as an in-memory stand-in for
//! tests and the `mount_stat` demo binary, not as a production transport.

pub mod attr;
pub mod compound;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod mount;
pub mod path;
pub mod stat;
pub mod transport;
mod xdr;

pub use attr::{FileType, Stat, Timestamp};
pub use compound::{ArgOp, Bitmap, CompoundArgs};
pub use context::Context;
pub use error::{Error, InterruptReason, Nfsstat4, RpcFailure};
pub use handle::FileHandle;
pub use mount::MountState;
pub use transport::{CompoundReply, ResultOp, Transport};
