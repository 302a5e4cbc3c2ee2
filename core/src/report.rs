use std::collections::BTreeMap;
use std::time::Duration;

use sweepr_common::error::ProbeError;
use sweepr_common::network::target::Target;

use crate::worker::{Outcome, UnitState};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURES: u8 = 1;
pub const EXIT_CANCELLED: u8 = 130;

/// Result of one work unit, produced exactly once per dispatched target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    /// Position of the target in enumeration order.
    pub index: usize,
    pub target: Target,
    /// Last state the unit reached. `Done` unless it panicked.
    pub state: UnitState,
    pub result: Result<Outcome, ProbeError>,
}

impl UnitReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Why the dispatcher stopped reading targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// The handoff sequence ended.
    #[default]
    Exhausted,
    /// A unit failed while fail-fast was enabled.
    FailFast,
    /// Someone called [`Dispatcher::cancel`](crate::Dispatcher::cancel).
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Units started; equals the number of targets received from the sequence.
    pub dispatched: usize,
    /// One entry per dispatched unit, sorted by enumeration index.
    pub units: Vec<UnitReport>,
    pub stop: StopReason,
    pub elapsed: Duration,
}

impl Report {
    pub fn new(mut units: Vec<UnitReport>, dispatched: usize, stop: StopReason, elapsed: Duration) -> Self {
        units.sort_by_key(|unit| unit.index);
        Self {
            dispatched,
            units,
            stop,
            elapsed,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.units.iter().filter(|unit| unit.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Target, &ProbeError)> {
        self.units
            .iter()
            .filter_map(|unit| unit.result.as_ref().err().map(|err| (&unit.target, err)))
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Failure counts grouped by [`ProbeError::kind`].
    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (_, err) in self.failures() {
            *counts.entry(err.kind()).or_default() += 1;
        }
        counts
    }

    pub fn is_success(&self) -> bool {
        self.stop == StopReason::Exhausted && self.failed() == 0
    }

    /// `0` when every unit succeeded, `130` after an external cancel, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        match self.stop {
            StopReason::Cancelled => EXIT_CANCELLED,
            _ if self.failed() > 0 => EXIT_FAILURES,
            StopReason::FailFast => EXIT_FAILURES,
            StopReason::Exhausted => EXIT_OK,
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
