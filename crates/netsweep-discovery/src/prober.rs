//! Per-address probing: reachability, names, and MAC resolution

use netsweep_core::{CandidateAddress, HostProbeResult, ProbeError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::arp::MacResolver;
use crate::hostname::HostnameResolver;
use crate::reachability::ReachabilityProbe;
use crate::scanner::ScannerConfig;

/// Probes a single candidate address.
///
/// Implementations must only touch the candidate they are given; the worker
/// pool runs many probes at once.
pub trait HostProber: Send + Sync + 'static {
    fn probe(
        &self,
        candidate: CandidateAddress,
    ) -> impl Future<Output = Result<HostProbeResult, ProbeError>> + Send;
}

/// Lifecycle of one probe task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Probing,
    /// Host answered; the MAC address may or may not have been resolved
    Reachable { mac_resolved: bool },
    Unreachable,
    Failed,
}

impl ProbeState {
    /// Final state for a finished probe
    pub fn settled(result: &Result<HostProbeResult, ProbeError>) -> Self {
        match result {
            Ok(host) if host.reachable => Self::Reachable {
                mac_resolved: host.mac_address.is_some(),
            },
            Ok(_) => Self::Unreachable,
            Err(_) => Self::Failed,
        }
    }
}

/// Prober backed by the network and system tools
#[derive(Debug, Clone)]
pub struct NetworkProber {
    reachability: ReachabilityProbe,
    hostnames: HostnameResolver,
    mac: MacResolver,
}

impl NetworkProber {
    pub fn new(
        reachability: ReachabilityProbe,
        hostnames: HostnameResolver,
        mac: MacResolver,
    ) -> Self {
        Self {
            reachability,
            hostnames,
            mac,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        let command_timeout = Duration::from_millis(config.command_timeout_ms);
        Self::new(
            ReachabilityProbe::new(
                Duration::from_millis(config.probe_timeout_ms),
                config.echo_port,
            ),
            HostnameResolver::new(config.platform, command_timeout),
            MacResolver::new(config.platform, command_timeout),
        )
    }
}

impl HostProber for NetworkProber {
    async fn probe(&self, candidate: CandidateAddress) -> Result<HostProbeResult, ProbeError> {
        let ip = candidate.addr();

        if !self.reachability.is_reachable(ip).await? {
            return Ok(HostProbeResult::unreachable(candidate.host_octet()));
        }

        let names = self.hostnames.lookup(ip).await;

        // A reachable host is reported even when its MAC cannot be resolved
        let mac = match self.mac.resolve(ip).await {
            Ok(mac) => mac,
            Err(e) => {
                warn!(ip = %ip, error = %e, "MAC resolution failed");
                None
            }
        };

        let result = HostProbeResult::reachable(candidate, names.hostname, names.canonical, mac);
        debug!(ip = %ip, record = %result.to_record(), "Host reachable");
        Ok(result)
    }
}
