//! # Target Enumerator
//!
//! Produces the Cartesian product `addresses × ports` in row-major order:
//! for `[a0, a1] × [p0, p1]` the sequence is `a0:p0, a0:p1, a1:p0, a1:p1`.
//!
//! The product is never materialized. [`Product`] only keeps two indices
//! into the input lists, and [`Enumerator::spawn`] streams it through a
//! bounded channel whose closure marks the end of the sequence.

use std::iter::FusedIterator;
use std::sync::Arc;

use sweepr_common::network::target::Target;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Receiving end of the handoff sequence. `recv()` yields `None` exactly
/// once, after the last target has been delivered.
pub type HandoffReceiver = mpsc::Receiver<Target>;

/// Lazy row-major iterator over `addresses × ports`.
#[derive(Debug, Clone)]
pub struct Product<'a> {
    addresses: &'a [String],
    ports: &'a [String],
    outer: usize,
    inner: usize,
}

pub fn product<'a>(addresses: &'a [String], ports: &'a [String]) -> Product<'a> {
    Product {
        addresses,
        ports,
        outer: 0,
        inner: 0,
    }
}

impl Iterator for Product<'_> {
    type Item = Target;

    fn next(&mut self) -> Option<Target> {
        if self.ports.is_empty() {
            return None;
        }
        let address = self.addresses.get(self.outer)?;
        let target = Target::new(address.as_str(), self.ports[self.inner].as_str());

        self.inner += 1;
        if self.inner == self.ports.len() {
            self.inner = 0;
            self.outer += 1;
        }
        Some(target)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .addresses
            .len()
            .saturating_sub(self.outer)
            .saturating_mul(self.ports.len())
            .saturating_sub(self.inner);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Product<'_> {}
impl FusedIterator for Product<'_> {}

#[derive(Debug, Clone)]
pub struct Enumerator {
    addresses: Arc<[String]>,
    ports: Arc<[String]>,
}

impl Enumerator {
    pub fn new<A, P, S, T>(addresses: A, ports: P) -> Self
    where
        A: IntoIterator<Item = S>,
        P: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
            ports: ports.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of targets the sequence will hold (`m × n`).
    pub fn len(&self) -> usize {
        self.addresses.len().saturating_mul(self.ports.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn iter(&self) -> Product<'_> {
        product(&self.addresses, &self.ports)
    }

    /// Starts the producer task and returns the handoff sequence.
    ///
    /// The producer blocks while the channel holds `capacity` undelivered
    /// targets. It stops early when `token` is cancelled or the receiver is
    /// dropped. In every case the sender is dropped on exit, closing the
    /// sequence. The join handle resolves to the number of targets sent.
    pub fn spawn(self, capacity: usize, token: CancellationToken) -> (HandoffReceiver, JoinHandle<usize>) {
        let (tx, rx) = mpsc::channel::<Target>(capacity.max(1));

        let handle = tokio::spawn(async move {
            let mut sent: usize = 0;

            for target in self.iter() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(sent, "enumeration cancelled");
                        break;
                    }
                    delivered = tx.send(target) => {
                        if delivered.is_err() {
                            debug!(sent, "handoff receiver dropped, stopping enumeration");
                            break;
                        }
                        sent += 1;
                    }
                }
            }

            debug!(sent, total = self.len(), "enumeration finished");
            sent
        });

        (rx, handle)
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
