use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CONCURRENCY: usize = 64;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone)]
pub struct Config {
    /// Emit one additional line per target.
    pub verbose: bool,
    /// 0 prints everything, 1 drops headers and progress, 2 also drops per-target lines.
    pub quiet: u8,
    /// Upper bound on work units running at the same time.
    pub concurrency: usize,
    /// Capacity of the handoff queue between the enumerator and the dispatcher.
    ///
    /// The enumerator blocks once the queue is full.
    pub queue_capacity: usize,
    /// Per-target timeout applied by network workers.
    pub timeout: Duration,
    /// Cancel remaining work after the first failed target.
    pub fail_fast: bool,
    /// Expand CIDR blocks, IPv4 ranges and port ranges in the input lists.
    pub expand: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            quiet: 0,
            concurrency: DEFAULT_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout: DEFAULT_TIMEOUT,
            fail_fast: false,
            expand: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidOption {
                name: "concurrency",
                reason: "must be at least 1".into(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidOption {
                name: "queue",
                reason: "must be at least 1".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidOption {
                name: "timeout",
                reason: "must be greater than 0 ms".into(),
            });
        }
        Ok(())
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
