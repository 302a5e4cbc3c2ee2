use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use sweepr_common::error::ProbeError;
use sweepr_common::network::target::Target;
use tokio::net::UdpSocket;

use super::tcp::DEFAULT_READ_LIMIT;
use super::{Outcome, WorkContext, Worker, banner_from};

/// UDP datagram probe.
///
/// Sends `payload` from an ephemeral socket connected to the target and waits
/// for one reply. Silence is not a failure: UDP cannot tell an open port
/// that ignores the payload from a filtered one.
#[derive(Debug, Clone)]
pub struct UdpProbeWorker {
    payload: Vec<u8>,
    read_limit: usize,
}

impl Default for UdpProbeWorker {
    fn default() -> Self {
        Self {
            payload: Vec::new(),
            read_limit: DEFAULT_READ_LIMIT,
        }
    }
}

impl UdpProbeWorker {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn with_read_limit(mut self, read_limit: usize) -> Self {
        self.read_limit = read_limit;
        self
    }
}

#[async_trait]
impl Worker for UdpProbeWorker {
    fn name(&self) -> &'static str {
        "udp"
    }

    async fn process(&self, target: &Target, ctx: &WorkContext) -> Result<Outcome, ProbeError> {
        ctx.ensure_active()?;

        let addrs: Vec<SocketAddr> = ctx.resolve(target).await?;
        let Some(&peer) = addrs.first() else {
            return Err(ProbeError::InvalidTarget(target.to_string()));
        };
        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local).await?;
        // Connecting lets ICMP port-unreachable surface as ConnectionRefused on recv.
        socket.connect(peer).await?;

        ctx.bounded(ctx.deadline(), socket.send(&self.payload)).await?;

        let mut buf: Vec<u8> = vec![0u8; self.read_limit.max(1)];
        match ctx.bounded(ctx.deadline(), socket.recv(&mut buf)).await {
            Ok(n) => Ok(Outcome::Open {
                banner: banner_from(&buf[..n]),
            }),
            Err(ProbeError::TimedOut(_)) => Ok(Outcome::Silent),
            Err(err) => Err(err),
        }
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
