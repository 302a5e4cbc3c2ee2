//! Shared data model for `sweepr`.
//!
//! * [`network`]: target lists parsed from user input and the composed
//!   `address:port` targets handed to workers.
//! * [`config`]: runtime knobs collected by the CLI.
//! * [`error`]: the error taxonomy shared across the workspace.

pub mod config;
pub mod error;
pub mod network;
