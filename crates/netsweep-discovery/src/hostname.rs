//! Reverse hostname lookup through the system resolver

use netsweep_core::Platform;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, trace};

use crate::process::run_captured;

/// Names resolved for a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostNames {
    /// Short name if the resolver knows one, otherwise the canonical name
    pub hostname: String,
    /// Fully qualified name reported first by the resolver
    pub canonical: String,
}

impl HostNames {
    /// Names for a host the resolver knows nothing about
    pub fn numeric(ip: Ipv4Addr) -> Self {
        let text = ip.to_string();
        Self {
            hostname: text.clone(),
            canonical: text,
        }
    }
}

/// Resolves host names with `getent hosts`
#[derive(Debug, Clone)]
pub struct HostnameResolver {
    platform: Platform,
    command_timeout: Duration,
}

impl HostnameResolver {
    pub fn new(platform: Platform, command_timeout: Duration) -> Self {
        Self {
            platform,
            command_timeout,
        }
    }

    /// Look up names for `ip`, falling back to the address text
    pub async fn lookup(&self, ip: Ipv4Addr) -> HostNames {
        if self.platform == Platform::Windows {
            return HostNames::numeric(ip);
        }

        let ip_text = ip.to_string();
        match run_captured("getent", &["hosts", &ip_text], self.command_timeout).await {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                parse_getent_hosts(&stdout).unwrap_or_else(|| HostNames::numeric(ip))
            }
            Ok(_) => {
                trace!(ip = %ip, "No reverse entry");
                HostNames::numeric(ip)
            }
            Err(e) => {
                debug!(ip = %ip, error = %e, "Hostname lookup failed");
                HostNames::numeric(ip)
            }
        }
    }
}

/// Parse `getent hosts` output: "<ip> <canonical> [aliases...]"
fn parse_getent_hosts(output: &str) -> Option<HostNames> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    let mut names = line.split_whitespace().skip(1);
    let canonical = names.next()?.to_string();

    let hostname = names
        .find(|alias| !alias.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| canonical.clone());

    Some(HostNames {
        hostname,
        canonical,
    })
}
