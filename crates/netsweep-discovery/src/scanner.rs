//! Subnet scanner that streams discovered hosts

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use netsweep_core::{Platform, ScanError, ScanRecord};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::arp::DEFAULT_COMMAND_TIMEOUT_MS;
use crate::pool::{PoolConfig, ProbeOutcome, ProbeWorkerPool, DEFAULT_CONCURRENCY};
use crate::prober::{HostProber, NetworkProber, ProbeState};
use crate::reachability::{DEFAULT_PROBE_TIMEOUT_MS, ECHO_PORT};
use crate::subnet::AddressSpace;

/// Lazy, single-use sequence of scan records
pub type ScanStream = BoxStream<'static, ScanRecord>;

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Any address inside the /24 to sweep; the local interface is used if unset
    pub base_address: Option<Ipv4Addr>,
    /// Reachability timeout per address in milliseconds
    pub probe_timeout_ms: u64,
    /// Timeout for each external command (ping, arp, getent) in milliseconds
    pub command_timeout_ms: u64,
    /// Maximum number of probes in flight
    pub concurrency: usize,
    /// Port used for the reachability connect
    pub echo_port: u16,
    /// Platform used to pick tool flags
    pub platform: Platform,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            base_address: None,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            concurrency: DEFAULT_CONCURRENCY,
            echo_port: ECHO_PORT,
            platform: Platform::detect(),
        }
    }
}

impl ScannerConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            concurrency: self.concurrency,
        }
    }
}

/// Running totals for one sweep
#[derive(Debug, Default)]
pub struct ScanSummary {
    reachable: AtomicUsize,
    unreachable: AtomicUsize,
    failed: AtomicUsize,
}

impl ScanSummary {
    fn record(&self, state: ProbeState) {
        let counter = match state {
            ProbeState::Reachable { .. } => &self.reachable,
            ProbeState::Unreachable => &self.unreachable,
            ProbeState::Failed | ProbeState::Pending | ProbeState::Probing => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reachable(&self) -> usize {
        self.reachable.load(Ordering::Relaxed)
    }

    pub fn unreachable(&self) -> usize {
        self.unreachable.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.reachable() + self.unreachable() + self.failed()
    }
}

/// Sweeps the local /24 and streams discovered hosts
pub struct SubnetScanner<P = NetworkProber> {
    config: ScannerConfig,
    prober: Arc<P>,
}

impl SubnetScanner<NetworkProber> {
    /// Create a scanner that probes the real network
    pub fn new(config: ScannerConfig) -> Self {
        let prober = Arc::new(NetworkProber::from_config(&config));
        Self { config, prober }
    }
}

impl<P: HostProber> SubnetScanner<P> {
    /// Create a scanner with a custom prober
    pub fn with_prober(config: ScannerConfig, prober: Arc<P>) -> Self {
        Self { config, prober }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Start a sweep of the configured or local subnet
    pub fn scan(&self) -> ScanStream {
        self.scan_with_cancel(CancellationToken::new())
    }

    /// Start a sweep that stops when `cancel` fires or the stream is dropped
    pub fn scan_with_cancel(&self, cancel: CancellationToken) -> ScanStream {
        self.scan_space(AddressSpace::resolve(self.config.base_address), cancel)
            .0
    }

    /// Sweep `space`, or emit the unavailable sentinel if it could not be resolved
    pub fn scan_space(
        &self,
        space: Result<AddressSpace, ScanError>,
        cancel: CancellationToken,
    ) -> (ScanStream, Arc<ScanSummary>) {
        let summary = Arc::new(ScanSummary::default());

        let space = match space {
            Ok(space) => space,
            Err(e) => {
                warn!(error = %e, "Local network unavailable, skipping sweep");
                let sentinel = stream::once(future::ready(ScanRecord::NetworkUnavailable));
                return (sentinel.boxed(), summary);
            }
        };

        info!(subnet = %space, concurrency = self.config.concurrency, "Starting subnet sweep");

        let pool = ProbeWorkerPool::new(self.prober.clone(), self.config.pool_config());
        let outcomes = pool.run(space.candidates(), cancel.clone());

        // Dropping the stream before it ends cancels every in-flight probe
        let guard = cancel.drop_guard();
        let tally = summary.clone();
        let finish = summary.clone();

        let records = outcomes
            .filter_map(move |outcome: ProbeOutcome| {
                tally.record(outcome.state);
                let record = if outcome.result.is_empty() {
                    None
                } else {
                    Some(ScanRecord::Host(outcome.result))
                };
                future::ready(record)
            })
            .chain(
                stream::once(async move {
                    guard.disarm();
                    info!(
                        subnet = %space,
                        reachable = finish.reachable(),
                        unreachable = finish.unreachable(),
                        failed = finish.failed(),
                        "Subnet sweep complete"
                    );
                    None::<ScanRecord>
                })
                .filter_map(future::ready),
            );

        (records.boxed(), summary)
    }
}
