//! # Error Taxonomy
//!
//! Two families of errors exist:
//!
//! * [`ConfigError`]: bad input detected before any work starts. Always fatal.
//! * [`ProbeError`]: a single target could not be processed. Collected into
//!   the final report, never aborts sibling work.

use std::io;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{what} list must not be empty")]
    EmptyList { what: &'static str },

    #[error("{what} list has an empty element at position {index}")]
    EmptyElement { what: &'static str, index: usize },

    #[error("invalid port '{value}': expected a number between 1 and 65535")]
    InvalidPort { value: String },

    #[error("invalid range '{value}': {reason}")]
    InvalidRange { value: String, reason: String },

    #[error("range '{value}' expands to {len} entries (limit is {limit})")]
    RangeTooLarge { value: String, len: u64, limit: usize },

    #[error("invalid option '{name}': {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

/// Classified cause of a failed work unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("connection refused")]
    Refused,

    #[error("timed out after {0} ms")]
    TimedOut(u64),

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("cancelled")]
    Cancelled,

    #[error("work unit panicked")]
    Panicked,
}

impl ProbeError {
    /// Stable, lowercase label used when grouping failures in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Refused => "refused",
            ProbeError::TimedOut(_) => "timeout",
            ProbeError::Unreachable(_) => "unreachable",
            ProbeError::InvalidTarget(_) => "invalid",
            ProbeError::Io(_) => "io",
            ProbeError::Cancelled => "cancelled",
            ProbeError::Panicked => "panicked",
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ProbeError::Refused,
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                ProbeError::Unreachable(err.to_string())
            }
            _ => ProbeError::Io(err.to_string()),
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
