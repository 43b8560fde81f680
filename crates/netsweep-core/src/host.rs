//! Probe results and the records emitted for them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::address::CandidateAddress;
use crate::error::ProbeError;

/// Record emitted in place of a scan when no local address is known
pub const NETWORK_UNAVAILABLE: &str = "network not available";

/// Outcome of probing one candidate address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProbeResult {
    /// Octet the probe task was assigned
    pub requested_octet: u8,
    /// Whether the host answered within the timeout
    pub reachable: bool,
    /// Dotted-quad address of the host (empty if not reachable)
    pub address: String,
    /// Host name from reverse lookup, or the address text
    pub hostname: String,
    /// Fully qualified name from reverse lookup, or the address text
    pub canonical_hostname: String,
    /// Hardware address, uppercased (if resolved)
    pub mac_address: Option<String>,
    /// When the probe finished
    pub discovered_at: DateTime<Utc>,
}

impl HostProbeResult {
    /// Result for a probe that failed or was abandoned
    pub fn empty(requested_octet: u8) -> Self {
        Self {
            requested_octet,
            reachable: false,
            address: String::new(),
            hostname: String::new(),
            canonical_hostname: String::new(),
            mac_address: None,
            discovered_at: Utc::now(),
        }
    }

    /// Result for a host that did not answer
    pub fn unreachable(requested_octet: u8) -> Self {
        Self::empty(requested_octet)
    }

    /// Result for a host that answered
    pub fn reachable(
        candidate: CandidateAddress,
        hostname: String,
        canonical_hostname: String,
        mac_address: Option<String>,
    ) -> Self {
        Self {
            requested_octet: candidate.host_octet(),
            reachable: true,
            address: candidate.addr().to_string(),
            hostname,
            canonical_hostname,
            mac_address,
            discovered_at: Utc::now(),
        }
    }

    /// True when there is nothing worth emitting for this address
    pub fn is_empty(&self) -> bool {
        !self.reachable || self.to_record().trim().is_empty()
    }

    /// Trailing octet of the address this result actually describes
    pub fn observed_octet(&self) -> Option<u8> {
        self.address
            .parse::<Ipv4Addr>()
            .ok()
            .map(|ip| ip.octets()[3])
    }

    /// Check that the result describes the address its task was assigned.
    ///
    /// Empty results carry no address and always pass.
    pub fn verify_octet(&self) -> Result<(), ProbeError> {
        match self.observed_octet() {
            Some(observed) if observed != self.requested_octet => Err(ProbeError::OctetMismatch {
                requested: self.requested_octet,
                observed,
            }),
            _ => Ok(()),
        }
    }

    /// Line-oriented text record for a discovered host
    pub fn to_record(&self) -> String {
        if !self.reachable {
            return String::new();
        }
        format!(
            "{} is on the network {} {} {} {}",
            self.address,
            self.hostname,
            self.canonical_hostname,
            self.address,
            self.mac_address.as_deref().unwrap_or("")
        )
    }
}

/// One element of a scan's output sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanRecord {
    /// A discovered host
    Host(HostProbeResult),
    /// Sentinel emitted when the local network address cannot be determined
    NetworkUnavailable,
}

impl std::fmt::Display for ScanRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(result) => write!(f, "{}", result.to_record()),
            Self::NetworkUnavailable => write!(f, "{}", NETWORK_UNAVAILABLE),
        }
    }
}
