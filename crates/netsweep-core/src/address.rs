//! Candidate host addresses within a /24 subnet

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use crate::error::ProbeError;

/// Host octets that are probed in a /24 (network and broadcast excluded)
pub const HOST_OCTETS: RangeInclusive<u8> = 1..=254;

/// One host address to probe.
///
/// The value is `Copy`: every probe task receives its own octets, so no two
/// tasks can ever observe each other's writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateAddress {
    octets: [u8; 4],
}

impl CandidateAddress {
    /// Build the candidate for `host_octet` inside the /24 of `base`
    pub fn new(base: Ipv4Addr, host_octet: u8) -> Result<Self, ProbeError> {
        if !HOST_OCTETS.contains(&host_octet) {
            return Err(ProbeError::InvalidOctet(host_octet));
        }

        let mut octets = base.octets();
        octets[3] = host_octet;
        Ok(Self { octets })
    }

    /// The trailing octet this candidate was created for
    pub fn host_octet(&self) -> u8 {
        self.octets[3]
    }

    pub fn addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.octets)
    }
}

impl std::fmt::Display for CandidateAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr())
    }
}
