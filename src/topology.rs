//! The fixed eight-node testbed and its named links.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use packet_sim::{
    DeviceId, DevicePair, NodeId, PointToPointConfig, RateErrorModel, SimEngine, StreamDefaults,
    Subnet,
};
use tracing::debug;

use crate::config::NetworkParameters;
use crate::error::{Error, Result};
use crate::transport::StreamTransport;

pub const NODE_COUNT: usize = 8;

/// Link endpoints in declaration order. Index `i` gets `10.1.{i+1}.0/24`.
pub const LINKS: [(u32, u32); 8] = [
    (0, 5),
    (1, 6),
    (2, 6),
    (3, 7),
    (4, 7),
    (5, 6),
    (5, 7),
    (6, 7),
];

pub const LINK_MTU: u32 = 1500;
pub const SEGMENT_SIZE: u32 = 1448;

/// Canonical link name `n{a}n{b}` with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkName {
    a: u32,
    b: u32,
}

impl LinkName {
    pub fn new(a: u32, b: u32) -> Option<Self> {
        (a < b).then_some(Self { a, b })
    }

    pub fn nodes(&self) -> (u32, u32) {
        (self.a, self.b)
    }
}

impl fmt::Display for LinkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}n{}", self.a, self.b)
    }
}

impl FromStr for LinkName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid link name '{s}': expected n<a>n<b> with a < b");
        let rest = s.strip_prefix('n').ok_or_else(invalid)?;
        let (a, b) = rest.split_once('n').ok_or_else(invalid)?;
        let a: u32 = a.parse().map_err(|_| invalid())?;
        let b: u32 = b.parse().map_err(|_| invalid())?;
        let name = LinkName::new(a, b).ok_or_else(invalid)?;
        // Leading zeros or signs would alias a canonical name
        if name.to_string() != s {
            return Err(invalid());
        }
        Ok(name)
    }
}

/// One built link: its devices, subnet and endpoint addresses.
#[derive(Debug, Clone)]
pub struct Link {
    name: LinkName,
    index: usize,
    nodes: [NodeId; 2],
    devices: DevicePair,
    subnet: Subnet,
    addresses: [Ipv4Addr; 2],
    fault: Option<Arc<RateErrorModel>>,
}

impl Link {
    pub fn name(&self) -> LinkName {
        self.name
    }

    /// Position in [`LINKS`].
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn devices(&self) -> DevicePair {
        self.devices
    }

    pub fn subnet(&self) -> Subnet {
        self.subnet
    }

    pub fn address(&self, endpoint: usize) -> Option<Ipv4Addr> {
        self.addresses.get(endpoint).copied()
    }

    /// Endpoint 0: the side traffic addressed to this link is delivered to.
    ///
    /// Faults bind here rather than to endpoint 1. Flows target the
    /// endpoint-0 address and the engine carries no acknowledgements, so
    /// endpoint 1 never receives a faulted flow's packets.
    pub fn receiving_device(&self) -> DeviceId {
        self.devices.0
    }

    pub fn fault(&self) -> Option<&Arc<RateErrorModel>> {
        self.fault.as_ref()
    }

    pub(crate) fn set_fault(&mut self, model: Arc<RateErrorModel>) {
        self.fault = Some(model);
    }
}

/// Node and link registry, built once per harness.
#[derive(Debug)]
pub struct Topology {
    nodes: Vec<NodeId>,
    links: Vec<Link>,
    fault_model: Option<Arc<RateErrorModel>>,
    transport: StreamTransport,
    seed: u64,
}

impl Topology {
    /// Build the testbed on `engine`.
    ///
    /// The engine is seeded and its stream defaults set before any node is
    /// created, so identical inputs always yield identical topologies.
    pub fn build<E: SimEngine>(
        engine: &mut E,
        params: &NetworkParameters,
        transport: StreamTransport,
        seed: u64,
    ) -> Result<Self> {
        engine.set_seed(seed);
        engine.set_stream_defaults(&StreamDefaults {
            socket_type: transport.type_name().to_string(),
            segment_size: SEGMENT_SIZE,
        })?;

        let nodes = engine.create_nodes(NODE_COUNT)?;
        if nodes.len() != NODE_COUNT {
            return Err(anyhow!(
                "engine created {} nodes, expected {NODE_COUNT}",
                nodes.len()
            )
            .into());
        }

        let p2p = PointToPointConfig {
            data_rate_bps: params.rate_bps(),
            delay: params.latency(),
            mtu: LINK_MTU,
        };
        let mut wired = Vec::with_capacity(LINKS.len());
        for &(a, b) in &LINKS {
            let ends = [nodes[a as usize], nodes[b as usize]];
            let link = engine.create_link(ends[0], ends[1])?;
            let devices = engine.install_point_to_point(link, &p2p)?;
            wired.push((ends, devices));
        }

        engine.install_network_stack(&nodes)?;

        let mut links = Vec::with_capacity(LINKS.len());
        for (index, ((a, b), (ends, devices))) in LINKS.into_iter().zip(wired).enumerate() {
            let name = LinkName { a, b };
            let subnet = subnet_for(index)?;
            let addresses = engine.assign_subnet(devices, subnet)?;
            debug!(link = %name, %subnet, a = %addresses[0], b = %addresses[1], "link built");
            links.push(Link {
                name,
                index,
                nodes: ends,
                devices,
                subnet,
                addresses,
                fault: None,
            });
        }

        engine.compute_global_routes()?;

        let fault_model = if params.has_errors() {
            Some(Arc::new(RateErrorModel::per_packet(params.error_rate())?))
        } else {
            None
        };

        debug!(
            nodes = NODE_COUNT,
            links = links.len(),
            transport = %transport,
            seed,
            faults = fault_model.is_some(),
            "topology built"
        );

        Ok(Self {
            nodes,
            links,
            fault_model,
            transport,
            seed,
        })
    }

    pub fn node(&self, index: usize) -> Result<NodeId> {
        self.nodes.get(index).copied().ok_or(Error::OutOfRange {
            index,
            limit: NODE_COUNT,
        })
    }

    pub fn link(&self, name: &str) -> Result<&Link> {
        let idx = self.position(name)?;
        Ok(&self.links[idx])
    }

    pub(crate) fn link_mut(&mut self, name: &str) -> Result<&mut Link> {
        let idx = self.position(name)?;
        Ok(&mut self.links[idx])
    }

    pub fn address_of(&self, name: &str, endpoint: usize) -> Result<Ipv4Addr> {
        self.link(name)?.address(endpoint).ok_or(Error::OutOfRange {
            index: endpoint,
            limit: 2,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn subnet_plan(&self) -> Vec<(LinkName, Subnet)> {
        self.links.iter().map(|l| (l.name, l.subnet)).collect()
    }

    /// The single shared fault model, present when the error rate is > 0.
    pub fn fault_model(&self) -> Option<&Arc<RateErrorModel>> {
        self.fault_model.as_ref()
    }

    pub fn transport(&self) -> StreamTransport {
        self.transport
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn position(&self, name: &str) -> Result<usize> {
        let parsed: LinkName = name.parse().map_err(|_| Error::not_found(name))?;
        self.links
            .iter()
            .position(|l| l.name == parsed)
            .ok_or_else(|| Error::not_found(name))
    }
}

fn subnet_for(index: usize) -> Result<Subnet> {
    let octet = u8::try_from(index + 1).map_err(|_| anyhow!("no subnet for link {index}"))?;
    Ok(Subnet::new(Ipv4Addr::new(10, 1, octet, 0), 24)?)
}
