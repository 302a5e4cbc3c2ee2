use colored::*;
use sweepr_common::error::ProbeError;
use sweepr_core::{Outcome, UnitReport};

use crate::terminal::colors;

/// Longest banner line shown per target.
const BANNER_WIDTH: usize = 48;

/// Main line for a finished unit, or `None` when the worker already printed it.
pub fn unit_line(unit: &UnitReport) -> Option<String> {
    let target: ColoredString = unit.target.to_string().color(colors::ACCENT);
    match &unit.result {
        Ok(Outcome::Announced) => None,
        Ok(Outcome::Open { .. }) => Some(format!("{target} {}", "open".color(colors::SUCCESS).bold())),
        Ok(Outcome::Silent) => Some(format!("{target} {}", "no reply (open|filtered)".color(colors::MUTED))),
        Err(err) => Some(format!("{target} {}", failure_label(err))),
    }
}

/// Extra line printed for every unit in verbose mode.
pub fn unit_detail(unit: &UnitReport) -> Option<String> {
    match &unit.result {
        Ok(Outcome::Announced) => None,
        Ok(Outcome::Open { banner: Some(banner) }) => Some(first_line(banner)),
        Ok(Outcome::Open { banner: None }) => Some(format!("unit #{} connected, no response", unit.index)),
        Ok(Outcome::Silent) => Some(format!("unit #{} sent datagram, nothing came back", unit.index)),
        Err(err) => Some(format!("unit #{} stopped while {:?}: {err}", unit.index, unit.state)),
    }
}

pub fn failure_label(err: &ProbeError) -> ColoredString {
    match err {
        ProbeError::Cancelled => err.kind().color(colors::MUTED),
        _ => err.kind().color(colors::FAILURE).bold(),
    }
}

fn first_line(banner: &str) -> String {
    let line: &str = banner.lines().next().unwrap_or_default();
    if line.chars().count() <= BANNER_WIDTH {
        return line.to_string();
    }
    let truncated: String = line.chars().take(BANNER_WIDTH).collect();
    format!("{truncated}…")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
