//! netsweep Core - Core types for local subnet host discovery
//!
//! This crate provides the foundational types shared by the scanner and daemon:
//! - Candidate addresses within a /24 subnet
//! - Per-host probe results and the records emitted for them
//! - Error taxonomy for probes and scans
//! - Platform selection for external tool flags

pub mod address;
pub mod error;
pub mod host;
pub mod platform;

pub use address::{CandidateAddress, HOST_OCTETS};
pub use error::{ProbeError, ScanError};
pub use host::{HostProbeResult, ScanRecord, NETWORK_UNAVAILABLE};
pub use platform::Platform;
