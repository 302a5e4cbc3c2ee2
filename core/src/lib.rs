//! # Sweep Engine
//!
//! Fans a single probe out over the Cartesian product of an address list
//! and a port list.
//!
//! ```text
//! Enumerator ──(bounded handoff)──> Dispatcher ──(fan-out)──> N workers ──(join)──> Report
//! ```
//!
//! * [`enumerator`]: lazily produces every `address:port` target in row-major order.
//! * [`dispatcher`]: consumes targets, bounds concurrency, cancels, and waits for completion.
//! * [`completion`]: the per-dispatcher counter of outstanding work units.
//! * [`worker`]: the pluggable action run once per target (announce, TCP, UDP).
//! * [`report`]: per-unit results aggregated into the final summary.
//!
//! High-level callers should start from [`sweep::sweep`].

pub mod completion;
pub mod dispatcher;
pub mod enumerator;
pub mod report;
pub mod sweep;
pub mod worker;

pub use dispatcher::{DispatchOptions, Dispatcher};
pub use enumerator::Enumerator;
pub use report::{Report, StopReason, UnitReport};
pub use worker::{Outcome, UnitState, WorkContext, Worker};
