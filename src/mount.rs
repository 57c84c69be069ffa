//! The mount handshake state machine (§4.5, C5).
//!
//! Each state transition below is an `.await` against [`Transport`]; because this is ordinary
//! `async fn` code, the compiler generates the continuation record the original's manual
//! heap-allocated `nfs_cb_data` stood in for (`SPEC_FULL.md` §9).

use tracing::{debug, warn};

use crate::compound::{
    ArgOp, Bitmap, CompoundArgs, SetClientIdArgs, SetClientIdConfirmArgs,
};
use crate::context::Context;
use crate::error::{Error, Nfsstat4};
use crate::handle::FileHandle;
use crate::transport::{CompoundReply, Transport};

/// Purely diagnostic: mirrors the progression `SPEC_FULL.md` §4.5 describes. Control flow
/// itself is ordinary sequential `?`-propagation, not a match on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Dialing,
    Identifying,
    Confirming,
    Rooting,
    Mounted,
}

/// Placeholder callback location advertised at `SETCLIENTID`; carried over from the original
/// since this core never implements a callback channel (server-initiated callbacks are an
/// explicit Non-goal).
const CALLBACK_NETID: &str = "tcp";
const CALLBACK_ADDR: &str = "0.0.0.0.0.0";
const CALLBACK_PROGRAM: u32 = 0;

fn check(
    ctx: &mut Context,
    op_name: &str,
    saved_path: &str,
    outcome: Result<CompoundReply, crate::error::RpcFailure>,
) -> Result<CompoundReply, Error> {
    let reply = outcome.map_err(|failure| {
        let err = Error::from(failure);
        warn!(%op_name, %saved_path, %err, "compound submission failed");
        ctx.last_error = Some(format!("NFS4: {op_name} (path {saved_path}) failed: {err}"));
        err
    })?;

    if reply.status == Nfsstat4::Ok {
        return Ok(reply);
    }

    ctx.last_error = Some(format!("NFS4: {op_name} (path {saved_path}) failed with {}", reply.status));
    warn!(%op_name, %saved_path, status = ?reply.status, "NFS4 operation failed");
    Err(Error::from(reply.status))
}

impl Context {
    /// Drives the four-step handshake: `CONNECT` → `SETCLIENTID` → `SETCLIENTID_CONFIRM` →
    /// `PUTROOTFH`+`LOOKUP*`+`GETFH`+`GETATTR` (§4.5). On success, `self.root_fh()` is populated
    /// and `self.cwd()` is the normalized export path. On failure, `self` is left without a root
    /// handle; any prior partial progress (e.g. a registered `client_id`) is not unwound, since
    /// it is harmless — `stat()` refuses to run without a root handle regardless.
    pub async fn mount(
        &mut self,
        transport: &impl Transport,
        server: &str,
        export: &str,
    ) -> Result<(), Error> {
        debug!(server, export, state = ?MountState::Dialing, "mounting");
        transport.connect(server).await.map_err(|failure| {
            let err = Error::from(failure);
            self.last_error = Some(format!("NFS4: connect to {server} failed: {err}"));
            err
        })?;
        self.server = Some(server.to_string());

        debug!(state = ?MountState::Identifying, "submitting SETCLIENTID");
        let set_client_id_args = CompoundArgs {
            ops: vec![ArgOp::SetClientId(SetClientIdArgs {
                verifier: self.verifier,
                id: &self.client_name,
                callback_program: CALLBACK_PROGRAM,
                callback_netid: CALLBACK_NETID,
                callback_addr: CALLBACK_ADDR,
                callback_ident: 1,
            })],
        };
        let outcome = transport.submit_compound(set_client_id_args).await;
        let reply = check(self, "SETCLIENTID", export, outcome)?;
        let (client_id, confirm) = reply
            .set_client_id()
            .ok_or_else(|| Error::InvalidData("SETCLIENTID reply missing its result".into()))?;
        self.client_id = Some(client_id);
        self.setclientid_confirm = Some(confirm);

        debug!(state = ?MountState::Confirming, "submitting SETCLIENTID_CONFIRM");
        let confirm_args = CompoundArgs {
            ops: vec![ArgOp::SetClientIdConfirm(SetClientIdConfirmArgs { client_id, confirm })],
        };
        let outcome = transport.submit_compound(confirm_args).await;
        check(self, "SETCLIENTID_CONFIRM", export, outcome)?;

        debug!(state = ?MountState::Rooting, "submitting PUTROOTFH+LOOKUP*+GETFH+GETATTR");
        let resolved_export = crate::path::normalize(export)?;
        let rooting_args = CompoundArgs::build(
            None,
            &resolved_export,
            [ArgOp::GetFh, ArgOp::GetAttr(Bitmap::supported_attrs())],
        );
        let outcome = transport.submit_compound(rooting_args).await;
        let reply = check(self, "PUTROOTFH+LOOKUP+GETFH+GETATTR", &resolved_export, outcome)?;

        let handle = reply
            .get_fh()
            .ok_or_else(|| Error::InvalidData("rooting compound reply missing GETFH result".into()))?;
        let root_fh = FileHandle::new(handle.as_bytes().to_vec())?;

        self.cwd = resolved_export;
        self.root_fh = Some(root_fh);
        debug!(state = ?MountState::Mounted, "mount complete");
        Ok(())
    }
}
