//! Application state management

use netsweep_discovery::{HostProber, NetworkProber, SubnetScanner};
use std::sync::Arc;

use crate::config::Config;

/// Shared application state
pub struct AppState<P = NetworkProber> {
    /// Subnet scanner shared by every request
    pub scanner: SubnetScanner<P>,
    /// Configuration
    pub config: Config,
}

impl AppState<NetworkProber> {
    /// Create state that probes the real network
    pub fn new(config: Config) -> Arc<Self> {
        let scanner = SubnetScanner::new(config.to_scanner_config());
        Self::with_scanner(config, scanner)
    }
}

impl<P: HostProber> AppState<P> {
    /// Create state around an existing scanner
    pub fn with_scanner(config: Config, scanner: SubnetScanner<P>) -> Arc<Self> {
        Arc::new(Self { scanner, config })
    }
}
