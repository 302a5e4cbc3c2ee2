use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::error::{ConfigError, ProbeError};
use sweepr_common::network::list::TargetList;
use sweepr_common::network::target::Target;
use sweepr_core::sweep::{sweep, sweep_with};
use sweepr_core::worker::AnnounceWorker;
use sweepr_core::{DispatchOptions, Dispatcher, Enumerator, Outcome, StopReason, WorkContext, Worker};

/// Records starts and completions so tests can check ordering around the final report.
#[derive(Default)]
struct Journal {
    started: Mutex<Vec<String>>,
    completed: AtomicUsize,
}

#[async_trait]
impl Worker for Journal {
    fn name(&self) -> &'static str {
        "journal"
    }

    async fn process(&self, target: &Target, _ctx: &WorkContext) -> Result<Outcome, ProbeError> {
        self.started.lock().unwrap().push(target.to_string());
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Announced)
    }
}

#[tokio::test]
async fn two_addresses_one_port() {
    let addresses = TargetList::parse_addresses("10.0.0.1,10.0.0.2", false).unwrap();
    let ports = TargetList::parse_ports("80", false).unwrap();
    let enumerator = Enumerator::new(addresses, ports);

    let produced: Vec<String> = enumerator.iter().map(|t| t.to_string()).collect();
    assert_eq!(produced, ["10.0.0.1:80", "10.0.0.2:80"]);

    let journal = Arc::new(Journal::default());
    let report = sweep(enumerator, journal.clone(), DispatchOptions::default()).await;

    assert_eq!(report.dispatched, 2);
    // The report is only returned once both units have completed.
    assert_eq!(journal.completed.load(Ordering::SeqCst), 2);
    assert_eq!(report.units.len(), 2);
    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn empty_address_list_finishes_immediately() {
    let enumerator = Enumerator::new(Vec::<String>::new(), ["80"]);
    let journal = Arc::new(Journal::default());
    let dispatcher = Dispatcher::new(DispatchOptions::default());

    let report = tokio::time::timeout(
        Duration::from_millis(500),
        sweep_with(&dispatcher, enumerator, journal.clone()),
    )
    .await
    .expect("empty sweep should not block");

    assert_eq!(report.dispatched, 0);
    assert!(report.units.is_empty());
    assert!(journal.started.lock().unwrap().is_empty());
    assert_eq!(dispatcher.counter().started(), 0);
    assert_eq!(report.stop, StopReason::Exhausted);
}

#[test]
fn empty_textual_input_is_a_configuration_error() {
    assert_eq!(
        TargetList::parse_addresses("", false),
        Err(ConfigError::EmptyList { what: "address" })
    );
    assert_eq!(
        TargetList::parse_ports(" ", false),
        Err(ConfigError::EmptyList { what: "port" })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dispatch_follows_enumeration_with_small_queue() {
    let ports: Vec<String> = (1..=50).map(|p| p.to_string()).collect();
    let enumerator = Enumerator::new(["10.0.0.1", "10.0.0.2"], ports);
    let expected: Vec<String> = enumerator.iter().map(|t| t.to_string()).collect();

    let journal = Arc::new(Journal::default());
    let options = DispatchOptions {
        concurrency: 1,
        queue_capacity: 1,
        ..DispatchOptions::default()
    };
    let report = sweep(enumerator, journal.clone(), options).await;

    // A single permit serializes units, so start order equals dispatch order.
    assert_eq!(*journal.started.lock().unwrap(), expected);
    assert_eq!(report.dispatched, 100);
    let reported: Vec<String> = report.units.iter().map(|u| u.target.to_string()).collect();
    assert_eq!(reported, expected);
}

#[tokio::test]
async fn announce_worker_verbose_lines() {
    let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = lines.clone();
    let worker = AnnounceWorker::new(Arc::new(move |line| sink_lines.lock().unwrap().push(line)));

    let options = DispatchOptions {
        verbose: true,
        concurrency: 1,
        ..DispatchOptions::default()
    };
    let report = sweep(Enumerator::new(["a", "b"], ["1"]), Arc::new(worker), options).await;
    assert!(report.is_success());

    let lines = lines.lock().unwrap();
    assert_eq!(
        *lines,
        [
            "announcing a:1",
            "a:1 handled by unit #0",
            "announcing b:1",
            "b:1 handled by unit #1",
        ]
    );
}
