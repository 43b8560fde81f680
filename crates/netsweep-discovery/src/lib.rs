//! netsweep Discovery - Concurrent host discovery on the local /24
//!
//! This crate provides the probe engine:
//! - Address space enumeration from the local interface
//! - Bounded-timeout reachability checks
//! - Hostname lookup and ARP-based MAC resolution via system tools
//! - A bounded worker pool streaming results as hosts are found

pub mod arp;
pub mod hostname;
pub mod pool;
pub mod prober;
mod process;
pub mod reachability;
pub mod scanner;
pub mod subnet;

pub use arp::MacResolver;
pub use hostname::{HostNames, HostnameResolver};
pub use pool::{PoolConfig, ProbeOutcome, ProbeWorkerPool};
pub use prober::{HostProber, NetworkProber, ProbeState};
pub use reachability::ReachabilityProbe;
pub use scanner::{ScanStream, ScanSummary, ScannerConfig, SubnetScanner};
pub use subnet::{local_ipv4, AddressSpace};
