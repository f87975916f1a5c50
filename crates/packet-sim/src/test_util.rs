//! Test doubles for code that drives a [`SimEngine`].

use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::engine::{
    AppId, AppWindow, EchoClientConfig, FiveTuple, OnOffConfig, Protocol, RawFlowCounters,
    SimEngine, StreamDefaults,
};
use crate::impairment::RateErrorModel;
use crate::time::SimTime;
use crate::topology::{DeviceId, DevicePair, LinkId, NodeId, PointToPointConfig, Subnet};

/// Zeroed counters for `tuple`.
pub fn raw_flow(flow_id: u32, tuple: FiveTuple) -> RawFlowCounters {
    RawFlowCounters {
        flow_id,
        tuple,
        tx_bytes: 0,
        rx_bytes: 0,
        tx_packets: 0,
        rx_packets: 0,
        lost_packets: 0,
        first_tx: None,
        last_rx: None,
    }
}

/// One call made against a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetSeed(u64),
    SetStreamDefaults(StreamDefaults),
    EnableDiagnostics(String),
    CreateNodes(usize),
    CreateLink(NodeId, NodeId),
    InstallPointToPoint(LinkId, PointToPointConfig),
    InstallNetworkStack(Vec<NodeId>),
    AssignSubnet(DevicePair, Subnet),
    ComputeGlobalRoutes,
    InstallPacketSink {
        node: NodeId,
        protocol: Protocol,
        port: u16,
        window: AppWindow,
    },
    InstallOnOff {
        node: NodeId,
        config: OnOffConfig,
        window: AppWindow,
    },
    InstallEchoServer {
        node: NodeId,
        port: u16,
        window: AppWindow,
    },
    InstallEchoClient {
        node: NodeId,
        config: EchoClientConfig,
        window: AppWindow,
    },
    SetReceiveErrorModel {
        device: DeviceId,
        rate: f64,
    },
    EnableCapture {
        label: String,
        device: DeviceId,
        promiscuous: bool,
    },
    InstallFlowMonitor,
    AdvanceTo(SimTime),
    CollectFlowCounters,
    Destroy,
}

/// Shared view of a [`RecordingEngine`]'s call log.
///
/// Stays readable after the engine itself has been moved into (and
/// consumed by) the code under test.
pub type CallLog = Rc<RefCell<Vec<EngineCall>>>;

/// Engine that performs nothing and records every call.
///
/// Ids are handed out sequentially the way a real engine would, and
/// [`SimEngine::collect_flow_counters`] returns whatever was preset with
/// [`RecordingEngine::with_counters`].
#[derive(Default)]
pub struct RecordingEngine {
    calls: CallLog,
    counters: Vec<RawFlowCounters>,
    fail_on: Option<&'static str>,
    nodes: u32,
    links: u32,
    devices: u32,
    apps: u32,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    pub fn with_counters(mut self, counters: Vec<RawFlowCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Make the named operation (e.g. `"advance_to"`) fail after recording.
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    fn record(&mut self, operation: &'static str, call: EngineCall) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.fail_on == Some(operation) {
            bail!("injected failure in {operation}");
        }
        Ok(())
    }

    fn next_app(&mut self) -> AppId {
        self.apps += 1;
        AppId(self.apps - 1)
    }
}

impl SimEngine for RecordingEngine {
    fn set_seed(&mut self, seed: u64) {
        self.calls.borrow_mut().push(EngineCall::SetSeed(seed));
    }

    fn set_stream_defaults(&mut self, defaults: &StreamDefaults) -> Result<()> {
        self.record(
            "set_stream_defaults",
            EngineCall::SetStreamDefaults(defaults.clone()),
        )
    }

    fn enable_diagnostics(&mut self, component: &str) {
        self.calls
            .borrow_mut()
            .push(EngineCall::EnableDiagnostics(component.to_string()));
    }

    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>> {
        self.record("create_nodes", EngineCall::CreateNodes(count))?;
        let first = self.nodes;
        self.nodes += count as u32;
        Ok((first..self.nodes).map(NodeId).collect())
    }

    fn create_link(&mut self, a: NodeId, b: NodeId) -> Result<LinkId> {
        self.record("create_link", EngineCall::CreateLink(a, b))?;
        self.links += 1;
        Ok(LinkId(self.links - 1))
    }

    fn install_point_to_point(
        &mut self,
        link: LinkId,
        config: &PointToPointConfig,
    ) -> Result<DevicePair> {
        self.record(
            "install_point_to_point",
            EngineCall::InstallPointToPoint(link, config.clone()),
        )?;
        let first = self.devices;
        self.devices += 2;
        Ok(DevicePair(DeviceId(first), DeviceId(first + 1)))
    }

    fn install_network_stack(&mut self, nodes: &[NodeId]) -> Result<()> {
        self.record(
            "install_network_stack",
            EngineCall::InstallNetworkStack(nodes.to_vec()),
        )
    }

    fn assign_subnet(&mut self, devices: DevicePair, subnet: Subnet) -> Result<[Ipv4Addr; 2]> {
        self.record("assign_subnet", EngineCall::AssignSubnet(devices, subnet))?;
        Ok([
            subnet.host(1).context("subnet has no first host")?,
            subnet.host(2).context("subnet has no second host")?,
        ])
    }

    fn compute_global_routes(&mut self) -> Result<()> {
        self.record("compute_global_routes", EngineCall::ComputeGlobalRoutes)
    }

    fn install_packet_sink(
        &mut self,
        node: NodeId,
        protocol: Protocol,
        port: u16,
        window: AppWindow,
    ) -> Result<AppId> {
        self.record(
            "install_packet_sink",
            EngineCall::InstallPacketSink {
                node,
                protocol,
                port,
                window,
            },
        )?;
        Ok(self.next_app())
    }

    fn install_on_off(
        &mut self,
        node: NodeId,
        config: &OnOffConfig,
        window: AppWindow,
    ) -> Result<AppId> {
        self.record(
            "install_on_off",
            EngineCall::InstallOnOff {
                node,
                config: config.clone(),
                window,
            },
        )?;
        Ok(self.next_app())
    }

    fn install_echo_server(
        &mut self,
        node: NodeId,
        port: u16,
        window: AppWindow,
    ) -> Result<AppId> {
        self.record(
            "install_echo_server",
            EngineCall::InstallEchoServer { node, port, window },
        )?;
        Ok(self.next_app())
    }

    fn install_echo_client(
        &mut self,
        node: NodeId,
        config: &EchoClientConfig,
        window: AppWindow,
    ) -> Result<AppId> {
        self.record(
            "install_echo_client",
            EngineCall::InstallEchoClient {
                node,
                config: config.clone(),
                window,
            },
        )?;
        Ok(self.next_app())
    }

    fn set_receive_error_model(
        &mut self,
        device: DeviceId,
        model: Arc<RateErrorModel>,
    ) -> Result<()> {
        self.record(
            "set_receive_error_model",
            EngineCall::SetReceiveErrorModel {
                device,
                rate: model.rate(),
            },
        )
    }

    fn enable_capture(&mut self, label: &str, device: DeviceId, promiscuous: bool) -> Result<()> {
        self.record(
            "enable_capture",
            EngineCall::EnableCapture {
                label: label.to_string(),
                device,
                promiscuous,
            },
        )
    }

    fn install_flow_monitor(&mut self) -> Result<()> {
        self.record("install_flow_monitor", EngineCall::InstallFlowMonitor)
    }

    fn advance_to(&mut self, stop: SimTime) -> Result<()> {
        self.record("advance_to", EngineCall::AdvanceTo(stop))
    }

    fn collect_flow_counters(&mut self) -> Result<Vec<RawFlowCounters>> {
        self.record("collect_flow_counters", EngineCall::CollectFlowCounters)?;
        Ok(self.counters.clone())
    }

    fn destroy(&mut self) {
        self.calls.borrow_mut().push(EngineCall::Destroy);
    }
}
