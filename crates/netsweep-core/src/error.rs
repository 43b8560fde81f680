//! Error types for probes and scans

use std::net::Ipv4Addr;
use thiserror::Error;

/// Failure of a single probe task.
///
/// None of these abort a scan: the worker pool converts every variant into an
/// empty result for the affected address.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Host octet {0} is outside 1..=254")]
    InvalidOctet(u8),
    #[error("Probe of {address} timed out")]
    Timeout { address: Ipv4Addr },
    #[error("Probe of {address} failed: {source}")]
    Io {
        address: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },
    #[error("Concurrent defect: requested octet {requested} but observed {observed}")]
    OctetMismatch { requested: u8, observed: u8 },
    #[error("Probe of {address} cancelled")]
    Cancelled { address: Ipv4Addr },
    #[error("Probe task for octet {octet} panicked: {message}")]
    TaskPanicked { octet: u8, message: String },
}

impl ProbeError {
    pub fn io(address: Ipv4Addr, source: std::io::Error) -> Self {
        Self::Io { address, source }
    }
}

/// Failure that stops a scan before any address is probed
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Network not available: {0}")]
    NetworkUnavailable(String),
}
