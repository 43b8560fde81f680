//! Local /24 address space enumeration

use netsweep_core::{CandidateAddress, ScanError, HOST_OCTETS};
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// Prefix length of every scanned subnet
pub const PREFIX_LEN: u8 = 24;

/// Interface name prefixes that never carry the LAN address
const IGNORED_INTERFACE_PREFIXES: &[&str] = &["lo", "docker", "br-", "veth"];

/// The /24 subnet being swept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpace {
    base: Ipv4Addr,
}

impl AddressSpace {
    /// Address space containing `addr`; host bits are cleared
    pub fn new(addr: Ipv4Addr) -> Self {
        let base = u32::from(addr) & prefix_mask(PREFIX_LEN);
        Self {
            base: Ipv4Addr::from(base),
        }
    }

    /// Address space of this machine's primary IPv4 interface
    pub fn local() -> Result<Self, ScanError> {
        local_ipv4().map(Self::new)
    }

    /// Use a configured base address, falling back to the local interface
    pub fn resolve(base_override: Option<Ipv4Addr>) -> Result<Self, ScanError> {
        match base_override {
            Some(addr) => Ok(Self::new(addr)),
            None => Self::local(),
        }
    }

    /// Every host address of the subnet, octets 1 to 254 in order
    pub fn candidates(&self) -> Vec<CandidateAddress> {
        HOST_OCTETS
            .filter_map(|octet| CandidateAddress::new(self.base, octet).ok())
            .collect()
    }
}

impl std::fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, PREFIX_LEN)
    }
}

fn prefix_mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !0u32 << (32 - prefix_len.min(32))
    }
}

/// Find this machine's LAN IPv4 address
pub fn local_ipv4() -> Result<Ipv4Addr, ScanError> {
    let interfaces = NetworkInterface::show()
        .map_err(|e| ScanError::NetworkUnavailable(e.to_string()))?;

    let addresses = interfaces.iter().flat_map(|iface| {
        iface.addr.iter().filter_map(move |addr| match addr {
            Addr::V4(v4) => Some((iface.name.as_str(), v4.ip)),
            Addr::V6(_) => None,
        })
    });

    match select_lan_address(addresses) {
        Some(ip) => {
            debug!(ip = %ip, "Resolved local address");
            Ok(ip)
        }
        None => Err(ScanError::NetworkUnavailable(
            "no IPv4 interface with a LAN address".to_string(),
        )),
    }
}

/// Pick the first usable address from (interface name, address) pairs
fn select_lan_address<'a>(
    addresses: impl IntoIterator<Item = (&'a str, Ipv4Addr)>,
) -> Option<Ipv4Addr> {
    addresses.into_iter().find_map(|(name, ip)| {
        let ignored = IGNORED_INTERFACE_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix));
        if ignored || ip.is_loopback() || ip.is_link_local() || ip.is_unspecified() {
            trace!(interface = name, ip = %ip, "Skipping interface address");
            None
        } else {
            Some(ip)
        }
    })
}
