//! The (out of scope) RPC/XDR transport, modeled as a trait boundary (§4.8, C8).
//!
//! Grounded on the teacher crate's `rpc::Rpc`/`vfs::Vfs` trait split: the core depends on a
//! narrow `async_trait` boundary and ships one in-memory implementation for tests and the demo
//! binary, the same relationship the teacher crate has between its NFSv3 dispatch loop and its
//! `InMemoryVfs` example fixture.

use async_trait::async_trait;

use crate::compound::{ArgOp, CompoundArgs};
use crate::error::{Nfsstat4, RpcFailure};
use crate::handle::FileHandle;

/// One sub-operation's result, found in a [`CompoundReply`] by matching on its variant (by
/// "result tag", per `SPEC_FULL.md` §4.6) rather than by position.
#[derive(Debug, Clone)]
pub enum ResultOp {
    PutRootFh,
    PutFh,
    Lookup,
    GetFh(FileHandle),
    /// The raw `attrlist4` bytes for the bitmap the request echoed; [`crate::attr::decode`]
    /// parses this against the bitmap the caller itself requested.
    GetAttr(Vec<u8>),
    SetClientId { client_id: u64, confirm: [u8; 8] },
    SetClientIdConfirm,
}

/// The decoded reply to a submitted `COMPOUND4`: a top-level status plus one [`ResultOp`] per
/// sub-operation that executed before the first failure (RFC 7530 §13.1: a compound stops at
/// its first non-`NFS4_OK` op).
#[derive(Debug, Clone)]
pub struct CompoundReply {
    pub status: Nfsstat4,
    pub results: Vec<ResultOp>,
}

impl CompoundReply {
    /// Finds the first `GETFH` result, if any.
    pub fn get_fh(&self) -> Option<&FileHandle> {
        self.results.iter().find_map(|op| match op {
            ResultOp::GetFh(handle) => Some(handle),
            _ => None,
        })
    }

    /// Finds the first `GETATTR` result's raw attribute bytes, if any.
    pub fn get_attr(&self) -> Option<&[u8]> {
        self.results.iter().find_map(|op| match op {
            ResultOp::GetAttr(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// Finds the `SETCLIENTID` result, if any.
    pub fn set_client_id(&self) -> Option<(u64, [u8; 8])> {
        self.results.iter().find_map(|op| match op {
            ResultOp::SetClientId { client_id, confirm } => Some((*client_id, *confirm)),
            _ => None,
        })
    }
}

/// The seam between this crate's compound pipeline and an RPC/XDR transport (§4.8). This crate
/// implements neither connection management nor the full `COMPOUND4` XDR codec; callers supply
/// both via this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes (or verifies) a connection to `server`. Called once, at the start of
    /// [`crate::context::Context::mount`].
    async fn connect(&self, server: &str) -> Result<(), RpcFailure>;

    /// Serializes, submits, and awaits the reply to a single `COMPOUND4` request.
    async fn submit_compound<'a>(
        &self,
        args: CompoundArgs<'a>,
    ) -> Result<CompoundReply, RpcFailure>;
}

/// An in-memory `Transport` that plays server for a tiny, fixed virtual filesystem. Not a
/// production transport — it exists to drive the integration tests and the `mount_stat` demo
/// binary without a real network, the same role the teacher crate's `InMemoryVfs` plays for its
/// own examples.
pub mod loopback {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use tokio::sync::RwLock;

    use super::*;
    use crate::attr;
    use crate::compound::Bitmap;
    use crate::xdr;

    #[derive(Clone)]
    struct Node {
        fh: Vec<u8>,
        file_type: u32,
        size: u64,
        fileid: u64,
        mode: u32,
        nlink: u32,
        uid: u32,
        gid: u32,
        used: u64,
    }

    struct State {
        /// Normalized absolute path -> node, populated by [`LoopbackTransport::insert`].
        nodes: HashMap<String, Node>,
    }

    /// One-shot faults a test can schedule before driving a call, consumed the next time the
    /// matching step runs. Lets `tests/mount.rs`/`tests/stat.rs` exercise the RPC-layer and
    /// protocol-layer failure branches that a bare happy-path fake server never reaches.
    #[derive(Default)]
    struct Faults {
        connect: Option<RpcFailure>,
        submit: Option<RpcFailure>,
        set_client_id_status: Option<Nfsstat4>,
    }

    /// An in-memory stand-in server: a fixed set of paths, each assigned an opaque handle and a
    /// stat record, reachable from the root by `LOOKUP`.
    pub struct LoopbackTransport {
        state: RwLock<State>,
        faults: Mutex<Faults>,
        next_fileid: AtomicU64,
        next_clientid: AtomicU64,
    }

    impl Default for LoopbackTransport {
        fn default() -> Self {
            let mut nodes = HashMap::new();
            nodes.insert(
                "/".to_string(),
                Node {
                    fh: b"root".to_vec(),
                    file_type: 2, // DIR
                    size: 0,
                    fileid: 1,
                    mode: 0o755,
                    nlink: 2,
                    uid: 0,
                    gid: 0,
                    used: 4096,
                },
            );
            Self {
                state: RwLock::new(State { nodes }),
                faults: Mutex::new(Faults::default()),
                next_fileid: AtomicU64::new(2),
                next_clientid: AtomicU64::new(1),
            }
        }
    }

    impl LoopbackTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next [`Transport::connect`] call fail with `fault` instead of succeeding.
        pub fn fail_next_connect(&self, fault: RpcFailure) {
            self.faults.lock().unwrap().connect = Some(fault);
        }

        /// Makes the next [`Transport::submit_compound`] call fail with `fault` before any of
        /// its sub-operations run, simulating a transport-layer refusal (cancel, timeout, or a
        /// queue/allocation failure) rather than a protocol-level `nfsstat4`.
        pub fn fail_next_submit(&self, fault: RpcFailure) {
            self.faults.lock().unwrap().submit = Some(fault);
        }

        /// Makes the next `SETCLIENTID` sub-operation reply with `status` instead of
        /// succeeding, stopping the compound there (RFC 7530 §13.1).
        pub fn fail_next_set_client_id(&self, status: Nfsstat4) {
            self.faults.lock().unwrap().set_client_id_status = Some(status);
        }

        /// Registers a regular file at `path` (e.g. `/a/b.txt`) with the given contents length,
        /// for tests and the demo binary to `stat()` against. `path`'s parent directories are
        /// created implicitly.
        pub async fn insert_file(&self, path: &str, size: u64) {
            let mut state = self.state.write().await;

            let mut ancestor = String::new();
            for segment in path.trim_start_matches('/').split('/').rev().skip(1).rev() {
                ancestor = if ancestor.is_empty() { format!("/{segment}") } else { format!("{ancestor}/{segment}") };
                state.nodes.entry(ancestor.clone()).or_insert_with(|| {
                    let fileid = self.next_fileid.fetch_add(1, Ordering::Relaxed);
                    Node {
                        fh: ancestor.as_bytes().to_vec(),
                        file_type: 2, // DIR
                        size: 0,
                        fileid,
                        mode: 0o755,
                        nlink: 2,
                        uid: 0,
                        gid: 0,
                        used: 4096,
                    }
                });
            }

            let fileid = self.next_fileid.fetch_add(1, Ordering::Relaxed);
            state.nodes.insert(
                path.to_string(),
                Node {
                    fh: path.as_bytes().to_vec(),
                    file_type: 1, // REG
                    size,
                    fileid,
                    mode: 0o644,
                    nlink: 1,
                    uid: 1000,
                    gid: 100,
                    used: size,
                },
            );
        }

        fn encode_attr(node: &Node, bitmap: Bitmap) -> Vec<u8> {
            use crate::compound::fattr4::*;
            let mut buf = Vec::new();
            for bit in bitmap.iter_ascending() {
                match bit {
                    SUPPORTED_ATTRS => xdr::write_bitmap(&mut buf, &[1]),
                    TYPE => buf.extend_from_slice(&node.file_type.to_be_bytes()),
                    SIZE => buf.extend_from_slice(&node.size.to_be_bytes()),
                    FILEID => buf.extend_from_slice(&node.fileid.to_be_bytes()),
                    MODE => buf.extend_from_slice(&node.mode.to_be_bytes()),
                    NUMLINKS => buf.extend_from_slice(&node.nlink.to_be_bytes()),
                    OWNER => xdr::write_opaque(&mut buf, node.uid.to_string().as_bytes()),
                    OWNER_GROUP => xdr::write_opaque(&mut buf, node.gid.to_string().as_bytes()),
                    SPACE_USED => buf.extend_from_slice(&node.used.to_be_bytes()),
                    TIME_ACCESS | TIME_METADATA | TIME_MODIFY => {
                        buf.extend_from_slice(&0u64.to_be_bytes());
                        buf.extend_from_slice(&0u32.to_be_bytes());
                    }
                    _ => unreachable!("loopback transport only ever serves the bitmaps this crate itself requests"),
                }
            }
            buf
        }

        fn not_found() -> CompoundReply {
            CompoundReply { status: Nfsstat4::NoEnt, results: Vec::new() }
        }
    }

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn connect(&self, _server: &str) -> Result<(), RpcFailure> {
            if let Some(fault) = self.faults.lock().unwrap().connect.take() {
                return Err(fault);
            }
            Ok(())
        }

        async fn submit_compound<'a>(
            &self,
            args: CompoundArgs<'a>,
        ) -> Result<CompoundReply, RpcFailure> {
            if let Some(fault) = self.faults.lock().unwrap().submit.take() {
                return Err(fault);
            }

            let state = self.state.read().await;
            let mut results = Vec::with_capacity(args.ops.len());
            let mut cwd = String::from("/");

            for op in &args.ops {
                match op {
                    ArgOp::PutRootFh => {
                        cwd = "/".to_string();
                        if !state.nodes.contains_key(&cwd) {
                            return Ok(Self::not_found());
                        }
                        results.push(ResultOp::PutRootFh);
                    }
                    ArgOp::PutFh(handle) => {
                        let found = state.nodes.iter().find(|(_, n)| n.fh == handle.as_bytes());
                        match found {
                            Some((path, _)) => cwd = path.clone(),
                            None => return Ok(CompoundReply { status: Nfsstat4::BadHandle, results }),
                        }
                        results.push(ResultOp::PutFh);
                    }
                    ArgOp::Lookup(name) => {
                        let next =
                            if cwd == "/" { format!("/{name}") } else { format!("{cwd}/{name}") };
                        if !state.nodes.contains_key(&next) {
                            return Ok(CompoundReply { status: Nfsstat4::NoEnt, results });
                        }
                        cwd = next;
                        results.push(ResultOp::Lookup);
                    }
                    ArgOp::GetFh => {
                        let node = state.nodes.get(&cwd).expect("cwd always tracks a live node");
                        results.push(ResultOp::GetFh(
                            FileHandle::new(node.fh.clone()).expect("loopback handles stay under MAX_LEN"),
                        ));
                    }
                    ArgOp::GetAttr(bitmap) => {
                        let node = state.nodes.get(&cwd).expect("cwd always tracks a live node");
                        results.push(ResultOp::GetAttr(Self::encode_attr(node, *bitmap)));
                    }
                    ArgOp::SetClientId(_) => {
                        if let Some(status) = self.faults.lock().unwrap().set_client_id_status.take() {
                            return Ok(CompoundReply { status, results });
                        }
                        let client_id = self.next_clientid.fetch_add(1, Ordering::Relaxed);
                        results.push(ResultOp::SetClientId { client_id, confirm: [0xC0; 8] });
                    }
                    ArgOp::SetClientIdConfirm(_) => {
                        results.push(ResultOp::SetClientIdConfirm);
                    }
                }
            }

            Ok(CompoundReply { status: Nfsstat4::Ok, results })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::handle::FileHandle;

        #[tokio::test]
        async fn root_lookup_and_getattr_round_trip() {
            let transport = LoopbackTransport::new();
            let args = CompoundArgs::build(None, "/", [ArgOp::GetFh, ArgOp::GetAttr(Bitmap::stat())]);
            let reply = transport.submit_compound(args).await.unwrap();
            assert_eq!(reply.status, Nfsstat4::Ok);
            assert!(reply.get_fh().is_some());
            let stat = attr::decode(Bitmap::stat(), reply.get_attr().unwrap()).unwrap();
            assert_eq!(stat.mode & 0o170000, 0o040000);
        }

        #[tokio::test]
        async fn lookup_of_missing_child_fails_with_noent() {
            let transport = LoopbackTransport::new();
            let args = CompoundArgs::build(None, "/missing", []);
            let reply = transport.submit_compound(args).await.unwrap();
            assert_eq!(reply.status, Nfsstat4::NoEnt);
        }

        #[tokio::test]
        async fn putfh_with_unknown_handle_fails_with_badhandle() {
            let transport = LoopbackTransport::new();
            let bogus = FileHandle::new(b"nonexistent".to_vec()).unwrap();
            let args = CompoundArgs::build(Some(&bogus), "/", [ArgOp::GetFh]);
            let reply = transport.submit_compound(args).await.unwrap();
            assert_eq!(reply.status, Nfsstat4::BadHandle);
        }

        #[tokio::test]
        async fn fail_next_connect_is_returned_verbatim() {
            let transport = LoopbackTransport::new();
            transport.fail_next_connect(RpcFailure::TimedOut);
            assert_eq!(transport.connect("server").await, Err(RpcFailure::TimedOut));
            // One-shot: the next connect succeeds.
            assert_eq!(transport.connect("server").await, Ok(()));
        }

        #[tokio::test]
        async fn fail_next_submit_short_circuits_before_any_op_runs() {
            let transport = LoopbackTransport::new();
            transport.fail_next_submit(RpcFailure::NoMemory);
            let args = CompoundArgs::build(None, "/", [ArgOp::GetFh]);
            let result = transport.submit_compound(args).await;
            assert_eq!(result.err(), Some(RpcFailure::NoMemory));
        }

        #[tokio::test]
        async fn fail_next_set_client_id_stops_the_compound_there() {
            let transport = LoopbackTransport::new();
            transport.fail_next_set_client_id(Nfsstat4::ClidInUse);
            let args = CompoundArgs {
                ops: vec![ArgOp::SetClientId(crate::compound::SetClientIdArgs {
                    verifier: [0; 8],
                    id: "client",
                    callback_program: 0,
                    callback_netid: "tcp",
                    callback_addr: "0.0.0.0.0.0",
                    callback_ident: 1,
                })],
            };
            let reply = transport.submit_compound(args).await.unwrap();
            assert_eq!(reply.status, Nfsstat4::ClidInUse);
            assert!(reply.set_client_id().is_none());
        }

        #[tokio::test]
        async fn inserted_file_is_reachable_by_lookup() {
            let transport = LoopbackTransport::new();
            transport.insert_file("/a.txt", 1024).await;
            let args = CompoundArgs::build(None, "/a.txt", [ArgOp::GetAttr(Bitmap::stat())]);
            let reply = transport.submit_compound(args).await.unwrap();
            assert_eq!(reply.status, Nfsstat4::Ok);
            let stat = attr::decode(Bitmap::stat(), reply.get_attr().unwrap()).unwrap();
            assert_eq!(stat.size, 1024);
        }
    }
}
