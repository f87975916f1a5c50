//! The control surface an experiment harness drives.
//!
//! [`SimEngine`] is deliberately small: build nodes and links, install
//! protocol stacks and applications, attach error models and captures, run
//! to a stop time and read back per-flow counters. [`crate::PacketSim`] is
//! the in-process implementation; tests use
//! [`crate::test_util::RecordingEngine`].

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::impairment::RateErrorModel;
use crate::time::SimTime;
use crate::topology::{DeviceId, DevicePair, LinkId, NodeId, PointToPointConfig, Subnet};

/// Handle for an installed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(pub u32);

/// Transport protocol carried by a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// IP protocol number.
    pub const fn number(self) -> u8 {
        match self {
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
        }
    }

    /// Combined IP + transport header bytes added to each payload.
    pub const fn header_bytes(self) -> u32 {
        match self {
            Protocol::Tcp => 40,
            Protocol::Udp => 28,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Defaults applied to every stream socket created afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefaults {
    /// Congestion-control implementation, e.g. `"TcpLinuxReno"`.
    pub socket_type: String,
    pub segment_size: u32,
}

/// Interval during which an application is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppWindow {
    pub start: SimTime,
    pub stop: SimTime,
}

impl AppWindow {
    pub fn from_secs(start: f64, stop: f64) -> Self {
        Self {
            start: SimTime::from_secs_f64(start),
            stop: SimTime::from_secs_f64(stop),
        }
    }

    pub fn contains(&self, t: SimTime) -> bool {
        self.start <= t && t < self.stop
    }
}

/// Constant-rate generator that alternates between ON and OFF periods.
#[derive(Debug, Clone, PartialEq)]
pub struct OnOffConfig {
    pub protocol: Protocol,
    pub remote: SocketAddrV4,
    pub data_rate_bps: u64,
    pub packet_size: u32,
    pub on_time: Duration,
    pub off_time: Duration,
}

/// Datagram requester that expects each packet echoed back.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoClientConfig {
    pub remote: SocketAddrV4,
    pub max_packets: u32,
    pub interval: Duration,
    pub packet_size: u32,
}

/// Classifier key of a unidirectional flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiveTuple {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: u8,
}

/// Counters accumulated by flow accounting for one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFlowCounters {
    pub flow_id: u32,
    pub tuple: FiveTuple,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub first_tx: Option<SimTime>,
    pub last_rx: Option<SimTime>,
}

pub trait SimEngine {
    /// Reseed the engine's random source. Call before building anything.
    fn set_seed(&mut self, seed: u64);

    fn set_stream_defaults(&mut self, defaults: &StreamDefaults) -> Result<()>;

    /// Turn on protocol-internal diagnostic logging for `component`.
    fn enable_diagnostics(&mut self, component: &str);

    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>>;

    fn create_link(&mut self, a: NodeId, b: NodeId) -> Result<LinkId>;

    fn install_point_to_point(
        &mut self,
        link: LinkId,
        config: &PointToPointConfig,
    ) -> Result<DevicePair>;

    fn install_network_stack(&mut self, nodes: &[NodeId]) -> Result<()>;

    /// Assign hosts `.1` and `.2` of `subnet` to the pair's devices.
    fn assign_subnet(&mut self, devices: DevicePair, subnet: Subnet) -> Result<[Ipv4Addr; 2]>;

    fn compute_global_routes(&mut self) -> Result<()>;

    fn install_packet_sink(
        &mut self,
        node: NodeId,
        protocol: Protocol,
        port: u16,
        window: AppWindow,
    ) -> Result<AppId>;

    fn install_on_off(
        &mut self,
        node: NodeId,
        config: &OnOffConfig,
        window: AppWindow,
    ) -> Result<AppId>;

    fn install_echo_server(&mut self, node: NodeId, port: u16, window: AppWindow)
    -> Result<AppId>;

    fn install_echo_client(
        &mut self,
        node: NodeId,
        config: &EchoClientConfig,
        window: AppWindow,
    ) -> Result<AppId>;

    fn set_receive_error_model(
        &mut self,
        device: DeviceId,
        model: Arc<RateErrorModel>,
    ) -> Result<()>;

    fn enable_capture(&mut self, label: &str, device: DeviceId, promiscuous: bool) -> Result<()>;

    /// Install flow accounting on every node.
    fn install_flow_monitor(&mut self) -> Result<()>;

    /// Process events until `stop` or until none remain.
    fn advance_to(&mut self, stop: SimTime) -> Result<()>;

    fn collect_flow_counters(&mut self) -> Result<Vec<RawFlowCounters>>;

    /// Release everything. The engine is unusable afterwards.
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_numbers() {
        assert_eq!(Protocol::Tcp.number(), 6);
        assert_eq!(Protocol::Udp.number(), 17);
    }

    #[test]
    fn window_is_half_open() {
        let w = AppWindow::from_secs(1.0, 60.0);
        assert!(!w.contains(SimTime::from_millis(999)));
        assert!(w.contains(SimTime::from_millis(1000)));
        assert!(w.contains(SimTime::from_millis(59_999)));
        assert!(!w.contains(SimTime::from_millis(60_000)));
    }
}
