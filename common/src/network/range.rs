//! Range notations accepted when list expansion is enabled.
//!
//! * CIDR blocks: `192.168.1.0/30`
//! * IPv4 ranges: `10.0.0.1-10.0.0.9`, or abbreviated `10.0.0.1-9`
//! * Port ranges: `8000-8010`

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use pnet::ipnetwork::Ipv4Network;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub(crate) fn len(&self) -> u64 {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        if end < start {
            return 0;
        }
        u64::from(end - start) + 1
    }

    pub fn to_iter(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from)
    }
}

pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, ConfigError> {
    let network = Ipv4Network::new(ip, prefix).map_err(|e| ConfigError::InvalidRange {
        value: format!("{ip}/{prefix}"),
        reason: e.to_string(),
    })?;

    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// Parses `s` as a CIDR block or an IPv4 range.
///
/// Returns `Ok(None)` when `s` uses neither notation, e.g. a plain address or a hostname.
pub fn parse_ipv4_range(s: &str) -> Result<Option<Ipv4Range>, ConfigError> {
    if let Some((ip_str, prefix_str)) = s.split_once('/') {
        let ip = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|e| invalid_range(s, format!("bad network address '{ip_str}': {e}")))?;
        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|e| invalid_range(s, format!("bad prefix '{prefix_str}': {e}")))?;
        return cidr_range(ip, prefix).map(Some);
    }

    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    // Hostnames may contain dashes; only treat this as a range if the start is an address.
    let Ok(start_addr) = start_str.parse::<Ipv4Addr>() else {
        return Ok(None);
    };

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;
    if u32::from(end_addr) < u32::from(start_addr) {
        return Err(invalid_range(s, "end address is lower than start address"));
    }

    Ok(Some(Ipv4Range::new(start_addr, end_addr)))
}

/// Parses `lo-hi` into an inclusive port range. `Ok(None)` for a single port.
pub fn parse_port_range(s: &str) -> Result<Option<RangeInclusive<u16>>, ConfigError> {
    let Some((lo_str, hi_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let lo = parse_port(lo_str.trim())?;
    let hi = parse_port(hi_str.trim())?;
    if hi < lo {
        return Err(invalid_range(s, "end port is lower than start port"));
    }

    Ok(Some(lo..=hi))
}

pub(crate) fn parse_port(s: &str) -> Result<u16, ConfigError> {
    match s.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort { value: s.to_string() }),
    }
}

/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, ConfigError> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(invalid_range(original_s, "end of range is empty"));
    }

    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| invalid_range(original_s, format!("bad end '{end_str}': {e}")))?;

    if partial_octets.len() > 4 {
        return Err(invalid_range(original_s, "end has too many octets"));
    }

    let mut end_octets = start_addr.octets();
    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

fn invalid_range(value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidRange {
        value: value.to_string(),
        reason: reason.into(),
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
