//! Entry points wiring an [`Enumerator`], a [`Dispatcher`] and a [`Worker`].

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dispatcher::{DispatchOptions, Dispatcher};
use crate::enumerator::Enumerator;
use crate::report::{Report, StopReason};
use crate::worker::Worker;

/// Runs `worker` once for every target of `enumerator` and waits for all of them.
pub async fn sweep(enumerator: Enumerator, worker: Arc<dyn Worker>, options: DispatchOptions) -> Report {
    let dispatcher = Dispatcher::new(options);
    sweep_with(&dispatcher, enumerator, worker).await
}

/// Like [`sweep`], but with a caller-owned dispatcher that can be cancelled
/// from elsewhere (e.g. on Ctrl-C).
pub async fn sweep_with(dispatcher: &Dispatcher, enumerator: Enumerator, worker: Arc<dyn Worker>) -> Report {
    let total: usize = enumerator.len();
    info!(
        addresses = enumerator.addresses().len(),
        ports = enumerator.ports().len(),
        targets = total,
        worker = worker.name(),
        "starting sweep"
    );

    let (targets, producer) = enumerator.spawn(dispatcher.options().queue_capacity, dispatcher.token());
    let report: Report = dispatcher.run(targets, worker).await;

    match producer.await {
        Ok(sent) if report.stop == StopReason::Exhausted && sent != report.dispatched => {
            warn!(sent, dispatched = report.dispatched, "enumerated and dispatched counts differ");
        }
        Ok(_) => {}
        Err(e) => error!("enumerator task failed: {e}"),
    }

    report
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
