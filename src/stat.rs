//! The `stat` operation (§4.6, C6): resolve a path against the mounted root and decode its
//! attributes.

use tracing::{trace, warn};

use crate::attr::{self, Stat};
use crate::compound::{ArgOp, Bitmap, CompoundArgs};
use crate::context::Context;
use crate::error::{Error, Nfsstat4};
use crate::transport::Transport;

impl Context {
    /// Resolves `path` against `self.cwd()`, submits `PUTFH`(root)+`LOOKUP*`+`GETATTR`, and
    /// decodes the `GETATTR` reply into a [`Stat`].
    ///
    /// `no_follow` is accepted but not honored, matching the original (`SPEC_FULL.md` §9):
    /// `LOOKUP` already follows symlinks on intermediate path components, and terminal-symlink
    /// semantics are not implemented.
    pub async fn stat(
        &mut self,
        transport: &impl Transport,
        path: &str,
        _no_follow: bool,
    ) -> Result<Stat, Error> {
        let root_fh = self.root_fh.as_ref().ok_or(Error::NotMounted)?;
        let resolved = crate::path::resolve(&self.cwd, path)?;
        trace!(path = %resolved, "stat");

        let args = CompoundArgs::build(Some(root_fh), &resolved, [ArgOp::GetAttr(Bitmap::stat())]);
        let outcome = transport.submit_compound(args).await;
        let reply = outcome.map_err(|failure| {
            let err = Error::from(failure);
            self.last_error = Some(format!("NFS4: GETATTR (path {resolved}) failed: {err}"));
            err
        })?;

        if reply.status != Nfsstat4::Ok {
            self.last_error = Some(format!(
                "NFS4: GETATTR (path {resolved}) failed with {}",
                reply.status
            ));
            warn!(path = %resolved, status = ?reply.status, "stat failed");
            return Err(Error::from(reply.status));
        }

        let attr_bytes = reply
            .get_attr()
            .ok_or_else(|| Error::InvalidData("GETATTR reply missing its result".into()))?;
        attr::decode(Bitmap::stat(), attr_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::loopback::LoopbackTransport;

    #[tokio::test]
    async fn stat_of_the_mounted_root_succeeds_s3() {
        let transport = LoopbackTransport::new();
        let mut ctx = Context::new("test-client");
        ctx.mount(&transport, "127.0.0.1", "/").await.unwrap();
        let stat = ctx.stat(&transport, "/", false).await.unwrap();
        assert_eq!(stat.mode & 0o170000, 0o040000); // S_IFDIR
    }

    #[tokio::test]
    async fn stat_of_an_inserted_file_reports_its_size() {
        let transport = LoopbackTransport::new();
        transport.insert_file("/a.txt", 2048).await;
        let mut ctx = Context::new("test-client");
        ctx.mount(&transport, "127.0.0.1", "/").await.unwrap();
        let stat = ctx.stat(&transport, "/a.txt", false).await.unwrap();
        assert_eq!(stat.size, 2048);
        assert_eq!(stat.blocks, 2048 / 4096);
    }

    #[tokio::test]
    async fn stat_before_mount_fails_fast() {
        let transport = LoopbackTransport::new();
        let mut ctx = Context::new("test-client");
        let result = ctx.stat(&transport, "/", false).await;
        assert!(matches!(result, Err(Error::NotMounted)));
    }

    #[tokio::test]
    async fn stat_of_a_missing_path_maps_to_protocol_error() {
        let transport = LoopbackTransport::new();
        let mut ctx = Context::new("test-client");
        ctx.mount(&transport, "127.0.0.1", "/").await.unwrap();
        let result = ctx.stat(&transport, "/missing", false).await;
        assert!(matches!(result, Err(Error::Protocol(Nfsstat4::NoEnt))));
        assert!(ctx.last_error().is_some());
    }

    /// Scenario S6: RPC timeout on stat.
    #[tokio::test]
    async fn stat_reports_rpc_timeout_with_its_own_message_s6() {
        use crate::error::{InterruptReason, RpcFailure};
        let transport = LoopbackTransport::new();
        let mut ctx = Context::new("test-client");
        ctx.mount(&transport, "127.0.0.1", "/").await.unwrap();

        transport.fail_next_submit(RpcFailure::TimedOut);
        let result = ctx.stat(&transport, "/", false).await;

        assert!(matches!(result, Err(Error::Interrupted(InterruptReason::TimedOut))));
        assert_eq!(result.unwrap_err().to_string(), "Command timed out");
    }
}
