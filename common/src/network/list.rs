//! # Target Lists
//!
//! An ordered, read-only sequence of non-empty strings parsed from one
//! comma-separated input, e.g. `"10.0.0.1,10.0.0.2"` or `"22,80,443"`.
//!
//! Empty input is a configuration error, not an empty list: `""` never
//! turns into a list holding a single empty target.

use std::ops::Deref;

use crate::error::ConfigError;
use crate::network::range;

/// Largest number of entries a single range element may expand into.
pub const MAX_EXPANSION: usize = 65_536;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList(Vec<String>);

impl TargetList {
    /// Parses an address list. Elements are split on `,` and trimmed. With `expand`, CIDR blocks and IPv4 ranges are
    /// replaced in place by the addresses they cover.
    pub fn parse_addresses(input: &str, expand: bool) -> Result<Self, ConfigError> {
        let elements = split_elements(input, "address")?;
        if !expand {
            return Ok(Self(elements));
        }

        let mut addresses = Vec::with_capacity(elements.len());
        for element in elements {
            match range::parse_ipv4_range(&element)? {
                Some(ipv4_range) => {
                    check_expansion(&element, ipv4_range.len())?;
                    addresses.extend(ipv4_range.to_iter().map(|ip| ip.to_string()));
                }
                None => addresses.push(element),
            }
        }
        Ok(Self(addresses))
    }

    /// Parses a port list. Every element must be a port in `1..=65535`;
    /// with `expand`, `lo-hi` elements are replaced by each port in between.
    pub fn parse_ports(input: &str, expand: bool) -> Result<Self, ConfigError> {
        let elements = split_elements(input, "port")?;

        let mut ports = Vec::with_capacity(elements.len());
        for element in elements {
            if expand {
                if let Some(port_range) = range::parse_port_range(&element)? {
                    let len = u64::from(*port_range.end() - *port_range.start()) + 1;
                    check_expansion(&element, len)?;
                    ports.extend(port_range.map(|port| port.to_string()));
                    continue;
                }
            }
            ports.push(range::parse_port(&element)?.to_string());
        }
        Ok(Self(ports))
    }
}

impl Deref for TargetList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for TargetList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<S: Into<String>> FromIterator<S> for TargetList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

fn split_elements(input: &str, what: &'static str) -> Result<Vec<String>, ConfigError> {
    if input.trim().is_empty() {
        return Err(ConfigError::EmptyList { what });
    }

    input
        .split(',')
        .enumerate()
        .map(|(index, part)| {
            let part = part.trim();
            if part.is_empty() {
                Err(ConfigError::EmptyElement { what, index })
            } else {
                Ok(part.to_string())
            }
        })
        .collect()
}

fn check_expansion(value: &str, len: u64) -> Result<(), ConfigError> {
    if len > MAX_EXPANSION as u64 {
        return Err(ConfigError::RangeTooLarge {
            value: value.to_string(),
            len,
            limit: MAX_EXPANSION,
        });
    }
    Ok(())
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

    #[test]
    fn splits_in_order_and_trims() {
        let list = TargetList::parse_addresses("10.0.0.1, 10.0.0.2 ,example.org", false).unwrap();
        assert_eq!(&list[..], ["10.0.0.1", "10.0.0.2", "example.org"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(
            TargetList::parse_addresses("", false),
            Err(ConfigError::EmptyList { what: "address" })
        );
        assert!(TargetList::parse_addresses("   ", false).is_err());
        assert!(TargetList::parse_ports("", false).is_err());
    }

    #[test]
    fn empty_elements_are_rejected() {
        assert_eq!(
            TargetList::parse_addresses("a,,b", false),
            Err(ConfigError::EmptyElement { what: "address", index: 1 })
        );
        assert!(TargetList::parse_ports("80,", false).is_err());
    }

    #[test]
    fn ports_must_be_numeric() {
        assert_eq!(
            &TargetList::parse_ports("22, 80,443", false).unwrap()[..],
            ["22", "80", "443"]
        );
        assert!(matches!(
            TargetList::parse_ports("http", false),
            Err(ConfigError::InvalidPort { .. })
        ));
        assert!(TargetList::parse_ports("0", false).is_err());
        assert!(TargetList::parse_ports("8000-8002", false).is_err());
    }

    #[test]
    fn expansion_preserves_list_order() {
        let addrs = TargetList::parse_addresses("host-a,10.0.0.1-3,10.0.1.0/31", true).unwrap();
        assert_eq!(
            &addrs[..],
            ["host-a", "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.1.0", "10.0.1.1"]
        );

        let ports = TargetList::parse_ports("22,8000-8002", true).unwrap();
        assert_eq!(&ports[..], ["22", "8000", "8001", "8002"]);
    }

    #[test]
    fn oversized_expansion_is_rejected() {
        assert!(matches!(
            TargetList::parse_addresses("10.0.0.0/8", true),
            Err(ConfigError::RangeTooLarge { .. })
        ));
    }
}
