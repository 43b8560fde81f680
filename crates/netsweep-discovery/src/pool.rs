//! Bounded worker pool running one probe task per candidate address

use futures_util::stream::{self, Stream, StreamExt};
use netsweep_core::{CandidateAddress, HostProbeResult, ProbeError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::prober::{HostProber, ProbeState};

/// Default number of probes in flight at once
pub const DEFAULT_CONCURRENCY: usize = 64;

/// Worker pool configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on concurrently running probes
    pub concurrency: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl PoolConfig {
    /// Effective pool width for `address_count` candidates
    pub fn width(&self, address_count: usize) -> usize {
        self.concurrency.min(address_count).max(1)
    }
}

/// Settled outcome of one probe task
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub octet: u8,
    pub state: ProbeState,
    /// Empty unless the host was reachable
    pub result: HostProbeResult,
}

/// Schedules probe tasks with bounded concurrency.
///
/// Every task is spawned on the runtime so a panicking prober only takes
/// down its own task. Tasks are admitted lazily as earlier ones finish, so a
/// consumer that stops polling also stops new probes from starting.
pub struct ProbeWorkerPool<P> {
    prober: Arc<P>,
    config: PoolConfig,
}

impl<P: HostProber> ProbeWorkerPool<P> {
    pub fn new(prober: Arc<P>, config: PoolConfig) -> Self {
        Self { prober, config }
    }

    /// Probe every candidate; outcomes arrive in completion order
    pub fn run(
        &self,
        candidates: Vec<CandidateAddress>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = ProbeOutcome> + Send + 'static {
        let width = self.config.width(candidates.len());
        let prober = self.prober.clone();

        debug!(
            candidates = candidates.len(),
            width, "Starting probe worker pool"
        );

        stream::iter(candidates)
            .map(move |candidate| run_task(prober.clone(), candidate, cancel.clone()))
            .buffer_unordered(width)
    }
}

async fn run_task<P: HostProber>(
    prober: Arc<P>,
    candidate: CandidateAddress,
    cancel: CancellationToken,
) -> ProbeOutcome {
    let octet = candidate.host_octet();
    let address = candidate.addr();
    trace!(ip = %address, state = ?ProbeState::Pending, "Probe task queued");

    let handle = tokio::spawn(async move {
        trace!(ip = %address, state = ?ProbeState::Probing, "Probe task started");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Cancelled { address }),
            result = prober.probe(candidate) => result,
        }
    });

    let result = match handle.await {
        Ok(result) => result,
        Err(e) => Err(ProbeError::TaskPanicked {
            octet,
            message: e.to_string(),
        }),
    };

    settle(octet, result)
}

/// Turn a task result into an outcome, replacing failures with empty results
fn settle(octet: u8, result: Result<HostProbeResult, ProbeError>) -> ProbeOutcome {
    let result = result.and_then(|host| {
        if host.requested_octet != octet {
            return Err(ProbeError::OctetMismatch {
                requested: octet,
                observed: host.requested_octet,
            });
        }
        host.verify_octet().map(|()| host)
    });

    let state = ProbeState::settled(&result);
    let result = match result {
        Ok(host) => host,
        Err(e @ ProbeError::OctetMismatch { .. }) => {
            error!(octet, error = %e, "Probe result does not match its address");
            HostProbeResult::empty(octet)
        }
        Err(ProbeError::Cancelled { address }) => {
            trace!(ip = %address, "Probe cancelled");
            HostProbeResult::empty(octet)
        }
        Err(e) => {
            error!(octet, error = %e, "Probe failed");
            HostProbeResult::empty(octet)
        }
    };

    trace!(octet, state = ?state, "Probe task finished");
    ProbeOutcome {
        octet,
        state,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::subnet::AddressSpace;

    fn candidates() -> Vec<CandidateAddress> {
        AddressSpace::new(Ipv4Addr::new(192, 168, 50, 0)).candidates()
    }

    /// Every host answers after a delay that varies by octet
    struct EchoProber;

    impl HostProber for EchoProber {
        async fn probe(&self, candidate: CandidateAddress) -> Result<HostProbeResult, ProbeError> {
            let delay = (255 - candidate.host_octet()) as u64 % 13;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let name = format!("host-{}", candidate.host_octet());
            Ok(HostProbeResult::reachable(candidate, name.clone(), name, None))
        }
    }

    /// Panics for one octet and errors for another
    struct FaultyProber {
        panic_octet: u8,
        error_octet: u8,
    }

    impl HostProber for FaultyProber {
        async fn probe(&self, candidate: CandidateAddress) -> Result<HostProbeResult, ProbeError> {
            let octet = candidate.host_octet();
            if octet == self.panic_octet {
                panic!("injected fault for octet {}", octet);
            }
            if octet == self.error_octet {
                return Err(ProbeError::io(
                    candidate.addr(),
                    std::io::Error::other("injected error"),
                ));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(HostProbeResult::reachable(
                candidate,
                "h".to_string(),
                "h".to_string(),
                Some("AA:BB:CC:DD:EE:FF".to_string()),
            ))
        }
    }

    /// Tracks how many probes run at the same time
    #[derive(Default)]
    struct CountingProber {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl HostProber for CountingProber {
        async fn probe(&self, candidate: CandidateAddress) -> Result<HostProbeResult, ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(HostProbeResult::unreachable(candidate.host_octet()))
        }
    }

    /// Reports a neighbouring address, as an aliased buffer would
    struct AliasingProber;

    impl HostProber for AliasingProber {
        async fn probe(&self, candidate: CandidateAddress) -> Result<HostProbeResult, ProbeError> {
            let mut result =
                HostProbeResult::reachable(candidate, "x".to_string(), "x".to_string(), None);
            if candidate.host_octet() == 77 {
                result.address = "192.168.50.78".to_string();
            }
            Ok(result)
        }
    }

    /// Never finishes on its own
    struct HangingProber;

    impl HostProber for HangingProber {
        async fn probe(&self, _candidate: CandidateAddress) -> Result<HostProbeResult, ProbeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("probe should have been cancelled")
        }
    }

    #[test]
    fn test_width_is_bounded_by_address_count() {
        let config = PoolConfig { concurrency: 512 };
        assert_eq!(config.width(254), 254);
        let config = PoolConfig { concurrency: 16 };
        assert_eq!(config.width(254), 16);
        assert_eq!(config.width(0), 1);
        let config = PoolConfig { concurrency: 0 };
        assert_eq!(config.width(254), 1);
    }

    #[tokio::test]
    async fn test_all_octets_match_their_results() {
        let pool = ProbeWorkerPool::new(Arc::new(EchoProber), PoolConfig { concurrency: 254 });
        let outcomes: Vec<ProbeOutcome> = pool
            .run(candidates(), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(outcomes.len(), 254);
        let mut seen = HashSet::new();
        for outcome in &outcomes {
            assert_eq!(outcome.state, ProbeState::Reachable { mac_resolved: false });
            assert_eq!(outcome.result.requested_octet, outcome.octet);
            assert_eq!(outcome.result.observed_octet(), Some(outcome.octet));
            assert_eq!(outcome.result.hostname, format!("host-{}", outcome.octet));
            assert!(seen.insert(outcome.octet));
        }
        assert_eq!(seen.len(), 254);
    }

    #[tokio::test]
    async fn test_faulty_task_does_not_affect_siblings() {
        let prober = FaultyProber {
            panic_octet: 13,
            error_octet: 42,
        };
        let pool = ProbeWorkerPool::new(Arc::new(prober), PoolConfig { concurrency: 32 });
        let outcomes: Vec<ProbeOutcome> = tokio::time::timeout(
            Duration::from_secs(10),
            pool.run(candidates(), CancellationToken::new()).collect(),
        )
        .await
        .expect("pool should finish");

        assert_eq!(outcomes.len(), 254);
        for outcome in &outcomes {
            match outcome.octet {
                13 | 42 => {
                    assert_eq!(outcome.state, ProbeState::Failed);
                    assert!(outcome.result.is_empty());
                }
                _ => {
                    assert_eq!(outcome.state, ProbeState::Reachable { mac_resolved: true });
                    assert!(!outcome.result.is_empty());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let prober = Arc::new(CountingProber::default());
        let pool = ProbeWorkerPool::new(prober.clone(), PoolConfig { concurrency: 8 });
        let outcomes: Vec<ProbeOutcome> = pool
            .run(candidates(), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(outcomes.len(), 254);
        assert!(outcomes.iter().all(|o| o.state == ProbeState::Unreachable));
        let max = prober.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 8, "max in flight was {}", max);
        assert!(max >= 1);
    }

    #[tokio::test]
    async fn test_aliased_result_is_withheld() {
        let pool = ProbeWorkerPool::new(Arc::new(AliasingProber), PoolConfig::default());
        let outcomes: Vec<ProbeOutcome> = pool
            .run(candidates(), CancellationToken::new())
            .collect()
            .await;

        let defect = outcomes.iter().find(|o| o.octet == 77).unwrap();
        assert_eq!(defect.state, ProbeState::Failed);
        assert!(defect.result.is_empty());

        let reachable = outcomes.iter().filter(|o| !o.result.is_empty()).count();
        assert_eq!(reachable, 253);
    }

    #[tokio::test]
    async fn test_cancellation_releases_workers() {
        let pool = ProbeWorkerPool::new(Arc::new(HangingProber), PoolConfig { concurrency: 16 });
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcomes: Vec<ProbeOutcome> = tokio::time::timeout(
            Duration::from_secs(5),
            pool.run(candidates(), cancel).collect(),
        )
        .await
        .expect("cancelled pool should finish promptly");

        assert_eq!(outcomes.len(), 254);
        assert!(outcomes.iter().all(|o| o.state == ProbeState::Failed));
        assert!(outcomes.iter().all(|o| o.result.is_empty()));
    }
}
