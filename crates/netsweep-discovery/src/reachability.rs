//! Bounded-timeout reachability checks

use netsweep_core::ProbeError;
use std::future::Future;
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Default per-address reachability timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

/// TCP echo port; any answer on it (even a refusal) proves the host is up
pub const ECHO_PORT: u16 = 7;

/// Reachability check for a single address.
///
/// Connects to the echo port without privileges. An accepted or actively
/// refused connection means the host answered; silence until the timeout or
/// an unreachable route means it did not.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    timeout: Duration,
    port: u16,
}

impl Default for ReachabilityProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS), ECHO_PORT)
    }
}

impl ReachabilityProbe {
    pub fn new(timeout: Duration, port: u16) -> Self {
        Self { timeout, port }
    }

    /// Check whether `ip` answers within the timeout
    pub async fn is_reachable(&self, ip: Ipv4Addr) -> Result<bool, ProbeError> {
        let target = SocketAddr::from((ip, self.port));
        self.settle(ip, TcpStream::connect(target)).await
    }

    /// Bound a connect attempt by the timeout and classify how it ended
    async fn settle<F, S>(&self, ip: Ipv4Addr, connect: F) -> Result<bool, ProbeError>
    where
        F: Future<Output = io::Result<S>>,
    {
        match timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => {
                trace!(ip = %ip, "Connection accepted");
                Ok(true)
            }
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                trace!(ip = %ip, "Connection refused, host is up");
                Ok(true)
            }
            Ok(Err(e)) if is_no_answer(e.kind()) => {
                trace!(ip = %ip, error = %e, "No answer");
                Ok(false)
            }
            Ok(Err(e)) => Err(ProbeError::io(ip, e)),
            Err(_) => {
                trace!(ip = %ip, timeout_ms = self.timeout.as_millis() as u64, "Probe timed out");
                Ok(false)
            }
        }
    }
}

/// Connect errors that mean "nobody answered" rather than a local fault
fn is_no_answer(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkUnreachable
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
    )
}
