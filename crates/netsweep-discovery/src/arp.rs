//! ARP-based MAC address resolution
//!
//! A host's hardware address is read from the local ARP cache with `arp -a`.
//! The cache is only trusted after a fresh single-packet ping has confirmed
//! the host, which also makes sure the entry is populated.

use netsweep_core::Platform;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, trace};

use crate::process::run_captured;

/// Textual width of a colon- or hyphen-delimited MAC address
pub const MAC_TEXT_LEN: usize = 17;

/// Default timeout for each external command in milliseconds
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

/// Resolves MAC addresses with the system `ping` and `arp` tools
#[derive(Debug, Clone)]
pub struct MacResolver {
    platform: Platform,
    command_timeout: Duration,
}

impl MacResolver {
    pub fn new(platform: Platform, command_timeout: Duration) -> Self {
        Self {
            platform,
            command_timeout,
        }
    }

    /// Resolve the MAC address of `ip`.
    ///
    /// Returns `Ok(None)` when the confirmation ping fails or the ARP table
    /// has no usable entry. Errors mean a tool could not be run at all.
    pub async fn resolve(&self, ip: Ipv4Addr) -> io::Result<Option<String>> {
        if !self.ping_once(ip).await? {
            debug!(ip = %ip, "Confirmation ping failed, skipping ARP lookup");
            return Ok(None);
        }

        self.arp_lookup(ip).await
    }

    /// Send a single ping; true if the host replied
    pub async fn ping_once(&self, ip: Ipv4Addr) -> io::Result<bool> {
        let ip_text = ip.to_string();
        let flag = self.platform.ping_count_flag();

        let output = run_captured("ping", &[flag, "1", &ip_text], self.command_timeout).await?;
        trace!(ip = %ip, status = ?output.status, "Ping finished");
        Ok(output.status.success())
    }

    /// Query the ARP table for `ip`
    pub async fn arp_lookup(&self, ip: Ipv4Addr) -> io::Result<Option<String>> {
        let ip_text = ip.to_string();
        let output = run_captured("arp", &["-a", &ip_text], self.command_timeout).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(io::Error::other(format!(
                "arp -a {} failed: {}",
                ip,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mac = parse_arp_output(&stdout);
        debug!(ip = %ip, mac = ?mac, "ARP lookup finished");
        Ok(mac)
    }
}

/// Find the first MAC address in `arp -a` output.
///
/// Each non-blank line is trimmed and loses its leading marker character
/// (`?` on BSD/Linux, the indent on Windows) before extraction.
pub fn parse_arp_output(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(drop_first_char)
        .find_map(extract_mac_address)
}

/// Extract a MAC address from one line of `arp -a` output.
///
/// Windows separates columns with runs of spaces, so fields split on three
/// spaces are tried first. The single-spaced BSD/Linux layout is handled by
/// looking for a MAC-shaped word instead.
pub fn extract_mac_address(line: &str) -> Option<String> {
    line.split("   ")
        .map(str::trim)
        .find(|field| field.len() == MAC_TEXT_LEN)
        .or_else(|| {
            line.split_whitespace()
                .find(|word| word.len() == MAC_TEXT_LEN && is_mac_shaped(word))
        })
        .map(str::to_uppercase)
}

fn drop_first_char(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

/// Six hex pairs joined by ':' or '-'
fn is_mac_shaped(word: &str) -> bool {
    let bytes = word.as_bytes();
    let separator = bytes[2];
    if separator != b':' && separator != b'-' {
        return false;
    }

    bytes.chunks(3).all(|chunk| {
        chunk[0].is_ascii_hexdigit()
            && chunk[1].is_ascii_hexdigit()
            && chunk.get(2).map_or(true, |&b| b == separator)
    })
}
