//! # Work Units
//!
//! A [`Worker`] is the pluggable capability executed once per [`Target`].
//! The dispatcher owns scheduling, counting and cancellation; a worker
//! only decides what "processing a target" means:
//!
//! * [`AnnounceWorker`]: reports the target (and a second line when verbose).
//! * [`TcpConnectWorker`]: dials the target, optionally sends a request, reads a banner.
//! * [`UdpProbeWorker`]: sends a datagram and waits for a reply.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::error::ProbeError;
use sweepr_common::network::target::Target;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

mod tcp;
mod udp;

pub use tcp::TcpConnectWorker;
pub use udp::UdpProbeWorker;

/// Lifecycle of a single unit: `Created → Running → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Created,
    Running,
    Done,
}

/// What a successful unit observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The target was reported without any network I/O.
    Announced,
    /// The target answered. `banner` holds the start of its response, if any.
    Open { banner: Option<String> },
    /// A datagram was sent but nothing came back (open or filtered).
    Silent,
}

#[derive(Debug, Clone)]
pub struct WorkContext {
    /// Position of the target in enumeration order.
    pub index: usize,
    pub verbose: bool,
    pub timeout: Duration,
    pub token: CancellationToken,
}

impl WorkContext {
    pub fn ensure_active(&self) -> Result<(), ProbeError> {
        if self.token.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }
        Ok(())
    }

    /// Deadline for one blocking phase of the unit, starting now.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    /// Awaits `fut` until `deadline`, giving up early on cancellation.
    pub async fn bounded<F, T, E>(&self, deadline: Instant, fut: F) -> Result<T, ProbeError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ProbeError>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ProbeError::Cancelled),
            res = tokio::time::timeout_at(deadline, fut) => match res {
                Ok(inner) => inner.map_err(Into::into),
                Err(_elapsed) => Err(ProbeError::TimedOut(self.timeout.as_millis() as u64)),
            },
        }
    }

    /// Resolves `target` within one timeout phase.
    pub async fn resolve(&self, target: &Target) -> Result<Vec<SocketAddr>, ProbeError> {
        self.bounded(self.deadline(), target.socket_addrs()).await
    }
}

#[async_trait]
pub trait Worker: Send + Sync {
    /// Short name used in logs and headers.
    fn name(&self) -> &'static str;

    async fn process(&self, target: &Target, ctx: &WorkContext) -> Result<Outcome, ProbeError>;
}

/// Destination for lines emitted by [`AnnounceWorker`].
pub type LineSink = Arc<dyn Fn(String) + Send + Sync>;

pub struct AnnounceWorker {
    sink: LineSink,
}

impl AnnounceWorker {
    pub fn new(sink: LineSink) -> Self {
        Self { sink }
    }

    /// Announces through `tracing` instead of a custom sink.
    pub fn logging() -> Self {
        Self::new(Arc::new(|line| tracing::info!("{line}")))
    }
}

impl fmt::Debug for AnnounceWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnounceWorker").finish_non_exhaustive()
    }
}

#[async_trait]
impl Worker for AnnounceWorker {
    fn name(&self) -> &'static str {
        "announce"
    }

    async fn process(&self, target: &Target, ctx: &WorkContext) -> Result<Outcome, ProbeError> {
        ctx.ensure_active()?;

        (self.sink)(format!("announcing {target}"));
        if ctx.verbose {
            (self.sink)(format!("{target} handled by unit #{}", ctx.index));
        }
        Ok(Outcome::Announced)
    }
}

/// Turns raw response bytes into a printable single-string banner.
pub(crate) fn banner_from(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches(['\0', '\r', '\n', ' ']);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
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
