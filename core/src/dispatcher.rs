//! # Dispatcher
//!
//! Consumes the handoff sequence one target at a time and launches one
//! work unit per target:
//!
//! 1. acquire a permit from the pool (at most `concurrency` units in flight),
//! 2. increment the [`CompletionCounter`],
//! 3. spawn the unit with an owned copy of its target, its guard and its permit.
//!
//! While every permit is held the dispatcher stops reading, the bounded
//! handoff queue fills, and the enumerator blocks.
//!
//! Once the sequence ends (or the run is cancelled) the dispatcher waits
//! for the counter to reach zero and emits a single "all work finished"
//! notification together with the aggregated [`Report`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use sweepr_common::config::{self, Config};
use sweepr_common::error::ProbeError;
use sweepr_common::network::target::Target;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::completion::{CompletionCounter, CompletionGuard};
use crate::enumerator::HandoffReceiver;
use crate::report::{Report, StopReason, UnitReport};
use crate::worker::{Outcome, UnitState, WorkContext, Worker};

/// Invoked on the dispatcher task for every finished unit, in completion order.
pub type UnitCallback = Box<dyn Fn(&UnitReport) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Maximum number of units running at once.
    pub concurrency: usize,
    /// Capacity of the handoff queue feeding this dispatcher.
    pub queue_capacity: usize,
    pub unit_timeout: Duration,
    /// Cancel the remaining work after the first failed unit.
    pub fail_fast: bool,
    pub verbose: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            concurrency: config::DEFAULT_CONCURRENCY,
            queue_capacity: config::DEFAULT_QUEUE_CAPACITY,
            unit_timeout: config::DEFAULT_TIMEOUT,
            fail_fast: false,
            verbose: false,
        }
    }
}

impl From<&Config> for DispatchOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            concurrency: cfg.concurrency,
            queue_capacity: cfg.queue_capacity,
            unit_timeout: cfg.timeout,
            fail_fast: cfg.fail_fast,
            verbose: cfg.verbose,
        }
    }
}

/// Drives a single sweep.
///
/// Cancellation and the fail-fast flag are never reset, so a dispatcher is
/// spent once [`run`](Self::run) returns: a later run dispatches nothing and
/// repeats the previous [`StopReason`]. Build a new one per sweep.
pub struct Dispatcher {
    options: DispatchOptions,
    counter: CompletionCounter,
    token: CancellationToken,
    failed_fast: Arc<AtomicBool>,
    on_unit_done: Option<UnitCallback>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("options", &self.options)
            .field("counter", &self.counter)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            options,
            counter: CompletionCounter::new(),
            token: CancellationToken::new(),
            failed_fast: Arc::new(AtomicBool::new(false)),
            on_unit_done: None,
        }
    }

    pub fn with_callback(mut self, on_unit_done: UnitCallback) -> Self {
        self.on_unit_done = Some(on_unit_done);
        self
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn counter(&self) -> &CompletionCounter {
        &self.counter
    }

    /// Token shared by the dispatcher, its units, and (usually) the enumerator.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Requests an early stop. Running units observe the token and drain;
    /// [`run`](Self::run) still waits for all of them before returning.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub async fn run(&self, mut targets: HandoffReceiver, worker: Arc<dyn Worker>) -> Report {
        let started_at = Instant::now();
        let permits = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<UnitReport>();

        let mut reports: Vec<UnitReport> = Vec::new();
        let mut dispatched: usize = 0;
        let mut permit: Option<OwnedSemaphorePermit> = None;

        debug!(worker = worker.name(), concurrency = self.options.concurrency, "dispatcher started");

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                Some(report) = report_rx.recv() => self.collect(report, &mut reports),
                acquired = permits.clone().acquire_owned(), if permit.is_none() => match acquired {
                    Ok(acquired) => permit = Some(acquired),
                    Err(_closed) => break,
                },
                next = targets.recv(), if permit.is_some() => {
                    let (Some(target), Some(unit_permit)) = (next, permit.take()) else {
                        break;
                    };
                    self.spawn_unit(dispatched, target, unit_permit, worker.clone(), report_tx.clone());
                    dispatched += 1;
                }
            }
        }

        drop(permit);
        drop(targets);
        drop(report_tx);

        loop {
            tokio::select! {
                Some(report) = report_rx.recv() => self.collect(report, &mut reports),
                _ = self.counter.wait_zero() => break,
            }
        }
        // Every unit sends its report before its guard drops.
        while let Ok(report) = report_rx.try_recv() {
            self.collect(report, &mut reports);
        }

        let stop = if self.failed_fast.load(Ordering::SeqCst) {
            StopReason::FailFast
        } else if self.token.is_cancelled() {
            StopReason::Cancelled
        } else {
            StopReason::Exhausted
        };

        let report = Report::new(reports, dispatched, stop, started_at.elapsed());
        info!(
            dispatched = report.dispatched,
            succeeded = report.succeeded(),
            failed = report.failed(),
            stop = ?report.stop,
            "all work finished"
        );
        report
    }

    fn collect(&self, report: UnitReport, reports: &mut Vec<UnitReport>) {
        if let Err(err) = &report.result {
            debug!(index = report.index, target = %report.target, kind = err.kind(), "unit failed: {err}");
        }
        if let Some(on_unit_done) = &self.on_unit_done {
            on_unit_done(&report);
        }
        reports.push(report);
    }

    fn spawn_unit(
        &self,
        index: usize,
        target: Target,
        permit: OwnedSemaphorePermit,
        worker: Arc<dyn Worker>,
        report_tx: mpsc::UnboundedSender<UnitReport>,
    ) {
        let mut unit = Unit {
            index,
            target,
            state: UnitState::Created,
            reported: false,
            report_tx,
            _permit: permit,
            _guard: self.counter.increment(),
        };

        let ctx = WorkContext {
            index,
            verbose: self.options.verbose,
            timeout: self.options.unit_timeout,
            token: self.token.clone(),
        };
        let fail_fast = self.options.fail_fast;
        let failed_fast = self.failed_fast.clone();

        tokio::spawn(async move {
            let result = if ctx.token.is_cancelled() {
                Err(ProbeError::Cancelled)
            } else {
                unit.transition(UnitState::Running);
                tokio::select! {
                    biased;
                    _ = ctx.token.cancelled() => Err(ProbeError::Cancelled),
                    result = worker.process(&unit.target, &ctx) => result,
                }
            };

            if fail_fast && matches!(&result, Err(err) if *err != ProbeError::Cancelled) {
                if !failed_fast.swap(true, Ordering::SeqCst) {
                    info!("{} failed with fail-fast enabled, cancelling remaining work", unit.target);
                }
                ctx.token.cancel();
            }

            unit.finish(result);
        });
    }
}

/// A dispatched unit. Reports exactly once: through [`Unit::finish`], or as
/// [`ProbeError::Panicked`] when dropped without finishing.
///
/// Fields drop after `Drop::drop` runs, so the report is always queued
/// before the guard releases the completion counter.
struct Unit {
    index: usize,
    target: Target,
    state: UnitState,
    reported: bool,
    report_tx: mpsc::UnboundedSender<UnitReport>,
    _permit: OwnedSemaphorePermit,
    _guard: CompletionGuard,
}

impl Unit {
    fn transition(&mut self, next: UnitState) {
        debug!(index = self.index, target = %self.target, from = ?self.state, to = ?next, "unit state");
        self.state = next;
    }

    fn finish(mut self, result: Result<Outcome, ProbeError>) {
        self.transition(UnitState::Done);
        self.send(result);
    }

    fn send(&mut self, result: Result<Outcome, ProbeError>) {
        self.reported = true;
        let _ = self.report_tx.send(UnitReport {
            index: self.index,
            target: self.target.clone(),
            state: self.state,
            result,
        });
    }
}

impl Drop for Unit {
    fn drop(&mut self) {
        if !self.reported {
            self.send(Err(ProbeError::Panicked));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::Enumerator;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Sleeps, then fails any target on port "13". Tracks peak concurrency.
    #[derive(Default)]
    struct ProbeRecorder {
        running: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<String>>,
        counter: Mutex<Option<CompletionCounter>>,
        invariant_broken: AtomicBool,
    }

    #[async_trait]
    impl Worker for ProbeRecorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn process(&self, target: &Target, _ctx: &WorkContext) -> Result<Outcome, ProbeError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if let Some(counter) = self.counter.lock().unwrap().as_ref() {
                // Read order matters: `started` only grows, so reading it last bounds the others.
                let outstanding = counter.outstanding();
                let completed = counter.completed();
                let started = counter.started();
                if outstanding == 0 || outstanding > started || completed > started {
                    self.invariant_broken.store(true, Ordering::SeqCst);
                }
            }

            tokio::time::sleep(Duration::from_millis(5)).await;
            self.seen.lock().unwrap().push(target.to_string());
            self.running.fetch_sub(1, Ordering::SeqCst);

            if target.port() == "13" {
                Err(ProbeError::Refused)
            } else {
                Ok(Outcome::Announced)
            }
        }
    }

    fn options(concurrency: usize) -> DispatchOptions {
        DispatchOptions {
            concurrency,
            queue_capacity: 2,
            ..DispatchOptions::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_target_runs_once_within_the_bound() {
        let ports: Vec<String> = (1..=10).map(|p| p.to_string()).collect();
        let enumerator = Enumerator::new(["10.0.0.1", "10.0.0.2", "10.0.0.3"], ports);
        let total = enumerator.len();

        let dispatcher = Dispatcher::new(options(4));
        let worker = Arc::new(ProbeRecorder::default());
        *worker.counter.lock().unwrap() = Some(dispatcher.counter().clone());

        let (rx, producer) = enumerator.spawn(2, dispatcher.token());
        let report = dispatcher.run(rx, worker.clone()).await;

        assert_eq!(producer.await.unwrap(), total);
        assert_eq!(report.dispatched, total);
        assert_eq!(report.units.len(), total);
        assert_eq!(report.succeeded(), total);
        assert_eq!(report.stop, StopReason::Exhausted);

        let mut seen = worker.seen.lock().unwrap().clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total, "no target skipped or duplicated");

        let peak = worker.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak concurrency {peak} exceeded the pool size");
        assert!(!worker.invariant_broken.load(Ordering::SeqCst));

        let counter = dispatcher.counter();
        assert_eq!(counter.outstanding(), 0);
        assert_eq!(counter.started(), total);
        assert_eq!(counter.completed(), total);
    }

    #[tokio::test]
    async fn report_preserves_enumeration_order() {
        let enumerator = Enumerator::new(["a", "b"], ["1", "2"]);
        let dispatcher = Dispatcher::new(options(8));
        let (rx, _producer) = enumerator.spawn(8, dispatcher.token());

        let report = dispatcher.run(rx, Arc::new(ProbeRecorder::default())).await;
        let order: Vec<String> = report.units.iter().map(|u| u.target.to_string()).collect();
        assert_eq!(order, ["a:1", "a:2", "b:1", "b:2"]);
        assert!(report.units.iter().all(|u| u.state == UnitState::Done));
    }

    #[tokio::test]
    async fn failures_do_not_cancel_siblings() {
        let enumerator = Enumerator::new(["10.0.0.1"], ["12", "13", "14"]);
        let dispatcher = Dispatcher::new(options(1));
        let (rx, _producer) = enumerator.spawn(1, dispatcher.token());

        let report = dispatcher.run(rx, Arc::new(ProbeRecorder::default())).await;
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.exit_code(), crate::report::EXIT_FAILURES);
    }

    #[tokio::test]
    async fn fail_fast_stops_after_first_failure() {
        let ports: Vec<String> = std::iter::once("13".to_string())
            .chain((100..200).map(|p| p.to_string()))
            .collect();
        let enumerator = Enumerator::new(["10.0.0.1"], ports);
        let dispatcher = Dispatcher::new(DispatchOptions {
            fail_fast: true,
            ..options(1)
        });
        let (rx, producer) = enumerator.spawn(1, dispatcher.token());

        let report = dispatcher.run(rx, Arc::new(ProbeRecorder::default())).await;
        assert_eq!(report.stop, StopReason::FailFast);
        assert!(report.dispatched < 101);
        assert_eq!(report.units.len(), report.dispatched);
        assert_eq!(report.exit_code(), crate::report::EXIT_FAILURES);
        assert!(producer.await.unwrap() < 101);
    }

    #[tokio::test]
    async fn cancel_drains_in_flight_units() {
        struct Forever;

        #[async_trait]
        impl Worker for Forever {
            fn name(&self) -> &'static str {
                "forever"
            }

            async fn process(&self, _target: &Target, _ctx: &WorkContext) -> Result<Outcome, ProbeError> {
                std::future::pending().await
            }
        }

        let enumerator = Enumerator::new(["10.0.0.1"], ["1", "2", "3"]);
        let dispatcher = Arc::new(Dispatcher::new(options(3)));
        let (rx, _producer) = enumerator.spawn(4, dispatcher.token());

        let canceller = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                dispatcher.cancel();
            })
        };

        let report = tokio::time::timeout(Duration::from_secs(1), dispatcher.run(rx, Arc::new(Forever)))
            .await
            .expect("cancelled run should drain promptly");
        canceller.await.unwrap();

        assert_eq!(report.stop, StopReason::Cancelled);
        assert_eq!(report.units.len(), report.dispatched);
        assert!(report.failures().all(|(_, err)| *err == ProbeError::Cancelled));
        assert_eq!(dispatcher.counter().outstanding(), 0);
    }

    #[tokio::test]
    async fn panicking_worker_is_reported_not_lost() {
        struct Panics;

        #[async_trait]
        impl Worker for Panics {
            fn name(&self) -> &'static str {
                "panics"
            }

            async fn process(&self, target: &Target, _ctx: &WorkContext) -> Result<Outcome, ProbeError> {
                if target.port() == "2" {
                    panic!("worker bug");
                }
                Ok(Outcome::Announced)
            }
        }

        let enumerator = Enumerator::new(["h"], ["1", "2", "3"]);
        let dispatcher = Dispatcher::new(options(3));
        let (rx, _producer) = enumerator.spawn(4, dispatcher.token());

        let report = dispatcher.run(rx, Arc::new(Panics)).await;
        assert_eq!(report.units.len(), 3);
        assert_eq!(report.units[1].result, Err(ProbeError::Panicked));
        assert_eq!(report.units[1].state, UnitState::Running);
        assert_eq!(report.succeeded(), 2);
    }

    #[tokio::test]
    async fn spent_dispatcher_dispatches_nothing() {
        let dispatcher = Dispatcher::new(DispatchOptions {
            fail_fast: true,
            ..options(1)
        });
        let (rx, _producer) = Enumerator::new(["h"], ["13"]).spawn(1, dispatcher.token());
        let first = dispatcher.run(rx, Arc::new(ProbeRecorder::default())).await;
        assert_eq!(first.stop, StopReason::FailFast);

        let worker = Arc::new(ProbeRecorder::default());
        let (rx, _producer) = Enumerator::new(["h"], ["1", "2"]).spawn(1, dispatcher.token());
        let second = dispatcher.run(rx, worker.clone()).await;

        assert_eq!(second.dispatched, 0);
        assert_eq!(second.stop, StopReason::FailFast);
        assert!(worker.seen.lock().unwrap().is_empty());
        assert_eq!(dispatcher.counter().started(), 1);
    }

    #[tokio::test]
    async fn callback_sees_every_unit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let dispatcher = Dispatcher::new(options(2)).with_callback(Box::new(move |_unit| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let enumerator = Enumerator::new(["a", "b", "c"], ["1", "2"]);
        let (rx, _producer) = enumerator.spawn(2, dispatcher.token());
        dispatcher.run(rx, Arc::new(ProbeRecorder::default())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }
}
