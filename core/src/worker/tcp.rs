use std::net::SocketAddr;

use async_trait::async_trait;
use sweepr_common::error::ProbeError;
use sweepr_common::network::target::Target;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::{Outcome, WorkContext, Worker, banner_from};

pub const DEFAULT_READ_LIMIT: usize = 512;

/// TCP connect probe.
///
/// A completed handshake means the target is open. When a payload is set it
/// is written right after connecting, and up to `read_limit` bytes of the
/// response are kept as the banner.
#[derive(Debug, Clone)]
pub struct TcpConnectWorker {
    payload: Option<Vec<u8>>,
    read_limit: usize,
}

impl Default for TcpConnectWorker {
    fn default() -> Self {
        Self {
            payload: None,
            read_limit: DEFAULT_READ_LIMIT,
        }
    }
}

impl TcpConnectWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_read_limit(mut self, read_limit: usize) -> Self {
        self.read_limit = read_limit;
        self
    }

    async fn read_response(&self, stream: &mut TcpStream, ctx: &WorkContext) -> Result<Option<String>, ProbeError> {
        let deadline = ctx.deadline();
        let mut buf: Vec<u8> = vec![0u8; self.read_limit];
        let mut filled: usize = 0;

        while filled < buf.len() {
            match ctx.bounded(deadline, stream.read(&mut buf[filled..])).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ProbeError::Cancelled) => return Err(ProbeError::Cancelled),
                // The handshake already succeeded; a slow or reset peer just ends the banner.
                Err(err) => {
                    debug!("stopped reading response: {err}");
                    break;
                }
            }
        }

        Ok(banner_from(&buf[..filled]))
    }
}

#[async_trait]
impl Worker for TcpConnectWorker {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn process(&self, target: &Target, ctx: &WorkContext) -> Result<Outcome, ProbeError> {
        ctx.ensure_active()?;

        let addrs: Vec<SocketAddr> = ctx.resolve(target).await?;
        let mut stream: TcpStream = ctx.bounded(ctx.deadline(), TcpStream::connect(&addrs[..])).await?;

        let Some(payload) = self.payload.as_deref() else {
            return Ok(Outcome::Open { banner: None });
        };

        ctx.bounded(ctx.deadline(), stream.write_all(payload)).await?;
        let banner = self.read_response(&mut stream, ctx).await?;

        Ok(Outcome::Open { banner })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
