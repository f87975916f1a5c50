use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Result, bail};

/// Engine handle for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Engine handle for a point-to-point channel between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u32);

/// Engine handle for a network device (one end of a link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// The two devices installed on a link, in the link's endpoint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePair(pub DeviceId, pub DeviceId);

impl DevicePair {
    /// Device at `endpoint` (0 or 1).
    pub fn get(&self, endpoint: usize) -> Option<DeviceId> {
        match endpoint {
            0 => Some(self.0),
            1 => Some(self.1),
            _ => None,
        }
    }
}

/// Device/channel attributes for a point-to-point link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointToPointConfig {
    pub data_rate_bps: u64,
    pub delay: Duration,
    pub mtu: u32,
}

impl Default for PointToPointConfig {
    fn default() -> Self {
        Self {
            data_rate_bps: 500_000,
            delay: Duration::from_millis(1),
            mtu: 1500,
        }
    }
}

/// An IPv4 network, e.g. `10.1.3.0/24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    base: Ipv4Addr,
    prefix_len: u8,
}

impl Subnet {
    pub fn new(base: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 30 {
            bail!("prefix /{prefix_len} leaves no room for two hosts");
        }
        let subnet = Self { base, prefix_len };
        if u32::from(base) & !subnet.mask_bits() != 0 {
            bail!("{base} is not the network address of /{prefix_len}");
        }
        Ok(subnet)
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn mask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.mask_bits())
    }

    fn mask_bits(&self) -> u32 {
        u32::MAX.checked_shl(32 - u32::from(self.prefix_len)).unwrap_or(0)
    }

    /// The `n`-th host address (`n` starts at 1), if it fits in the subnet.
    pub fn host(&self, n: u32) -> Option<Ipv4Addr> {
        let host_bits = !self.mask_bits();
        // Reserve the all-ones broadcast address.
        if n == 0 || n >= host_bits {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.base) | n))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask_bits() == u32::from(self.base)
    }

    pub fn overlaps(&self, other: &Subnet) -> bool {
        self.contains(other.base) || other.contains(self.base)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}
