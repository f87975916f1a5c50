//! In-process reference engine.
//!
//! [`PacketSim`] is a deterministic discrete-event model of a
//! point-to-point IPv4 network: drop-tail device queues, serialization and
//! propagation delay, shortest-path routing, receive error models, simple
//! applications and five-tuple flow accounting. Stream traffic is sent as
//! segments that are retransmitted after [`RETRANSMIT_TIMEOUT`] when
//! dropped; there is no congestion control and no acknowledgement traffic,
//! so every congestion-control identifier behaves the same.

mod apps;
mod capture;
mod device;
mod flow_monitor;
mod packet;
mod routing;

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

use self::apps::{App, AppKind};
use self::capture::{Capture, Direction};
use self::device::Device;
pub use self::device::QUEUE_LIMIT;
use self::flow_monitor::FlowMonitor;
use self::packet::{Packet, PacketKind};
use self::routing::{Adjacency, RouteTable};
use crate::engine::{
    AppId, AppWindow, EchoClientConfig, FiveTuple, OnOffConfig, Protocol, RawFlowCounters,
    SimEngine, StreamDefaults,
};
use crate::impairment::RateErrorModel;
use crate::scheduler::Scheduler;
use crate::time::{SimTime, transmission_time};
use crate::topology::{DeviceId, DevicePair, LinkId, NodeId, PointToPointConfig, Subnet};

/// Seed used until [`SimEngine::set_seed`] is called.
pub const DEFAULT_SEED: u64 = 1;

/// Delay before a dropped stream segment is sent again.
pub const RETRANSMIT_TIMEOUT: Duration = Duration::from_secs(1);

const FIRST_EPHEMERAL_PORT: u16 = 49153;

enum Event {
    AppStart(AppId),
    AppStop(AppId),
    Toggle(AppId),
    Send { app: AppId, epoch: u64 },
    TxComplete(DeviceId),
    Arrive { device: DeviceId, packet: Packet },
    Retransmit(Packet),
}

struct NodeState {
    devices: SmallVec<[DeviceId; 4]>,
    stack: bool,
    next_port: u16,
}

impl NodeState {
    fn allocate_port(&mut self) -> u16 {
        let port = self.next_port;
        self.next_port = self.next_port.checked_add(1).unwrap_or(FIRST_EPHEMERAL_PORT);
        port
    }
}

struct LinkState {
    a: NodeId,
    b: NodeId,
    devices: Option<DevicePair>,
}

pub struct PacketSim {
    rng: StdRng,
    stream: StreamDefaults,
    diagnostics: Vec<String>,
    nodes: Vec<NodeState>,
    links: Vec<LinkState>,
    devices: Vec<Device>,
    subnets: Vec<Subnet>,
    owners: FxHashMap<Ipv4Addr, NodeId>,
    routes: RouteTable,
    apps: Vec<App>,
    scheduler: Scheduler<Event>,
    monitor: Option<FlowMonitor>,
    capture_dir: Option<PathBuf>,
    next_uid: u64,
    destroyed: bool,
}

impl Default for PacketSim {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSim {
    pub fn new() -> Self {
        Self {
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            stream: StreamDefaults {
                socket_type: "TcpNewReno".to_string(),
                segment_size: 536,
            },
            diagnostics: Vec::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            devices: Vec::new(),
            subnets: Vec::new(),
            owners: FxHashMap::default(),
            routes: RouteTable::default(),
            apps: Vec::new(),
            scheduler: Scheduler::new(),
            monitor: None,
            capture_dir: None,
            next_uid: 0,
            destroyed: false,
        }
    }

    /// Write capture traces into `dir` when a run finishes.
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = Some(dir.into());
        self
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn stream_defaults(&self) -> &StreamDefaults {
        &self.stream
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn ensure_live(&self) -> Result<()> {
        ensure!(!self.destroyed, "engine has been destroyed");
        Ok(())
    }

    fn node_state(&mut self, node: NodeId) -> Result<&mut NodeState> {
        self.nodes
            .get_mut(node.0 as usize)
            .with_context(|| format!("unknown {node}"))
    }

    fn device_mut(&mut self, device: DeviceId) -> Result<&mut Device> {
        self.devices
            .get_mut(device.0 as usize)
            .with_context(|| format!("unknown {device}"))
    }

    fn diagnostics_on(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    fn alloc_uid(&mut self) -> u64 {
        self.next_uid += 1;
        self.next_uid
    }

    fn install_app(&mut self, node: NodeId, window: AppWindow, kind: AppKind) -> Result<AppId> {
        self.ensure_live()?;
        ensure!(
            self.node_state(node)?.stack,
            "{node} has no network stack installed"
        );
        ensure!(
            window.start <= window.stop,
            "application stops ({}) before it starts ({})",
            window.stop,
            window.start
        );
        let id = AppId(self.apps.len() as u32);
        self.apps.push(App::new(node, window, kind));
        self.scheduler.schedule(window.start, Event::AppStart(id));
        self.scheduler.schedule(window.stop, Event::AppStop(id));
        Ok(id)
    }

    // -- event handling --

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::AppStart(id) => self.start_app(id),
            Event::AppStop(id) => {
                if let Some(app) = self.apps.get_mut(id.0 as usize) {
                    app.running = false;
                }
            }
            Event::Toggle(id) => self.toggle(id),
            Event::Send { app, epoch } => self.send(app, epoch),
            Event::TxComplete(device) => self.tx_complete(device),
            Event::Arrive { device, packet } => self.arrive(device, packet),
            Event::Retransmit(mut packet) => {
                packet.uid = self.alloc_uid();
                let origin = packet.origin;
                self.send_from(origin, packet);
            }
        }
    }

    fn start_app(&mut self, id: AppId) {
        let now = self.scheduler.now();
        let idx = id.0 as usize;
        let Some((node, remote)) = self.apps.get(idx).map(|a| (a.node, a.remote())) else {
            return;
        };

        if let Some((remote_ip, _)) = remote {
            let Some(source) = self.source_address(node, remote_ip) else {
                warn!(%node, %remote_ip, "no route to remote; application stays idle");
                return;
            };
            let Some(state) = self.nodes.get_mut(node.0 as usize) else {
                return;
            };
            let port = state.allocate_port();
            self.apps[idx].local = Some((source, port));
        }

        let app = &mut self.apps[idx];
        app.running = true;
        match &mut app.kind {
            AppKind::OnOff { config, on, epoch } => {
                *on = true;
                *epoch += 1;
                let toggle_at = now + config.on_time;
                let epoch = *epoch;
                self.scheduler.schedule(toggle_at, Event::Toggle(id));
                self.scheduler.schedule(now, Event::Send { app: id, epoch });
            }
            AppKind::EchoClient { .. } => {
                self.scheduler.schedule(now, Event::Send { app: id, epoch: 0 });
            }
            AppKind::Sink { .. } | AppKind::EchoServer { .. } => {}
        }
        if self.diagnostics_on() {
            debug!(app = id.0, %node, %now, "application started");
        }
    }

    fn toggle(&mut self, id: AppId) {
        let now = self.scheduler.now();
        let Some(app) = self.apps.get_mut(id.0 as usize) else {
            return;
        };
        if !app.running {
            return;
        }
        if let AppKind::OnOff { config, on, epoch } = &mut app.kind {
            *on = !*on;
            *epoch += 1;
            let period = if *on { config.on_time } else { config.off_time };
            let epoch = *epoch;
            self.scheduler.schedule(now + period, Event::Toggle(id));
            if *on {
                self.scheduler.schedule(now, Event::Send { app: id, epoch });
            }
        }
    }

    fn send(&mut self, id: AppId, send_epoch: u64) {
        let now = self.scheduler.now();
        let segment_size = self.stream.segment_size.max(1);
        let Some(app) = self.apps.get_mut(id.0 as usize) else {
            return;
        };
        if !app.running || !app.window.contains(now) {
            return;
        }
        let (Some((source, source_port)), Some((destination, destination_port))) =
            (app.local, app.remote())
        else {
            return;
        };
        let node = app.node;

        let mut payloads: SmallVec<[u32; 4]> = SmallVec::new();
        let (protocol, kind, next) = match &mut app.kind {
            AppKind::OnOff { config, on, epoch } => {
                if !*on || *epoch != send_epoch {
                    return;
                }
                let kind = match config.protocol {
                    Protocol::Tcp => {
                        let mut left = config.packet_size;
                        while left > 0 {
                            let chunk = left.min(segment_size);
                            payloads.push(chunk);
                            left -= chunk;
                        }
                        PacketKind::Segment
                    }
                    Protocol::Udp => {
                        payloads.push(config.packet_size);
                        PacketKind::Datagram
                    }
                };
                let gap = transmission_time(config.packet_size, config.data_rate_bps);
                (config.protocol, kind, Some(now + gap))
            }
            AppKind::EchoClient { config, sent } => {
                if *sent >= config.max_packets {
                    return;
                }
                *sent += 1;
                payloads.push(config.packet_size);
                let next = (*sent < config.max_packets).then(|| now + config.interval);
                (Protocol::Udp, PacketKind::EchoRequest, next)
            }
            AppKind::Sink { .. } | AppKind::EchoServer { .. } => return,
        };

        if let Some(at) = next {
            self.scheduler.schedule(
                at,
                Event::Send {
                    app: id,
                    epoch: send_epoch,
                },
            );
        }

        let tuple = FiveTuple {
            source,
            destination,
            source_port,
            destination_port,
            protocol: protocol.number(),
        };
        for payload in payloads {
            let packet = Packet {
                uid: self.alloc_uid(),
                origin: node,
                tuple,
                size: payload + protocol.header_bytes(),
                kind,
            };
            self.send_from(node, packet);
        }
    }

    /// Address of the interface `node` uses to reach `remote`.
    fn source_address(&self, node: NodeId, remote: Ipv4Addr) -> Option<Ipv4Addr> {
        let target = *self.owners.get(&remote)?;
        let device = self.routes.next_device(node, target)?;
        self.devices.get(device.0 as usize)?.address
    }

    /// Originate (or re-originate) a packet at `node`.
    fn send_from(&mut self, node: NodeId, packet: Packet) {
        let now = self.scheduler.now();
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_tx(now, &packet);
        }
        self.route(node, packet);
    }

    fn route(&mut self, node: NodeId, packet: Packet) {
        let Some(target) = self.owners.get(&packet.tuple.destination).copied() else {
            self.drop_packet(packet, "unknown destination");
            return;
        };
        if target == node {
            self.deliver(node, packet);
            return;
        }
        match self.routes.next_device(node, target) {
            Some(device) => self.transmit(device, packet),
            None => self.drop_packet(packet, "no route"),
        }
    }

    fn transmit(&mut self, device: DeviceId, packet: Packet) {
        let now = self.scheduler.now();
        let diagnostics = self.diagnostics_on();
        let Some(dev) = self.devices.get_mut(device.0 as usize) else {
            return;
        };
        match dev.enqueue(now, packet) {
            Ok(Some(busy)) => self.scheduler.schedule(now + busy, Event::TxComplete(device)),
            Ok(None) => {}
            Err(packet) => {
                if diagnostics {
                    debug!(%device, queued = dev.queued(), "transmit queue full");
                }
                self.drop_packet(packet, "queue overflow");
            }
        }
    }

    fn tx_complete(&mut self, device: DeviceId) {
        let now = self.scheduler.now();
        let Some(dev) = self.devices.get_mut(device.0 as usize) else {
            return;
        };
        let (done, next) = dev.complete(now);
        let (peer, delay) = (dev.peer, dev.config.delay);
        if let Some(packet) = done {
            self.scheduler
                .schedule(now + delay, Event::Arrive { device: peer, packet });
        }
        if let Some(busy) = next {
            self.scheduler.schedule(now + busy, Event::TxComplete(device));
        }
    }

    fn arrive(&mut self, device: DeviceId, packet: Packet) {
        let now = self.scheduler.now();
        let Some(dev) = self.devices.get_mut(device.0 as usize) else {
            return;
        };
        dev.observe(now, Direction::Rx, &packet);
        let node = dev.node;
        let corrupt = dev
            .error_model
            .as_ref()
            .is_some_and(|model| model.is_corrupt(packet.size, &mut self.rng));
        if corrupt {
            self.drop_packet(packet, "receive error");
            return;
        }
        self.route(node, packet);
    }

    fn deliver(&mut self, node: NodeId, packet: Packet) {
        let now = self.scheduler.now();
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_rx(now, &packet);
        }
        let protocol = match packet.tuple.protocol {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            _ => return,
        };
        let port = packet.tuple.destination_port;
        let listener = self
            .apps
            .iter()
            .position(|app| app.node == node && app.listens(protocol, port));

        match (packet.kind, listener) {
            (PacketKind::EchoRequest, Some(idx)) => {
                let AppKind::EchoServer { echoed, .. } = &mut self.apps[idx].kind else {
                    return;
                };
                *echoed += 1;
                let t = packet.tuple;
                let reply = Packet {
                    uid: self.alloc_uid(),
                    origin: node,
                    tuple: FiveTuple {
                        source: t.destination,
                        destination: t.source,
                        source_port: t.destination_port,
                        destination_port: t.source_port,
                        protocol: t.protocol,
                    },
                    size: packet.size,
                    kind: PacketKind::EchoReply,
                };
                self.send_from(node, reply);
            }
            (PacketKind::Segment | PacketKind::Datagram, Some(idx)) => {
                if let AppKind::Sink { received_bytes, .. } = &mut self.apps[idx].kind {
                    *received_bytes += u64::from(packet.size.saturating_sub(protocol.header_bytes()));
                }
            }
            (PacketKind::EchoReply, _) => {}
            (_, None) => {
                if self.diagnostics_on() {
                    trace!(%node, port, uid = packet.uid, "no listener for delivered packet");
                }
            }
        }
    }

    fn drop_packet(&mut self, packet: Packet, reason: &'static str) {
        let now = self.scheduler.now();
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_loss(&packet);
        }
        if self.diagnostics_on() {
            debug!(
                uid = packet.uid,
                src = %packet.tuple.source,
                dst = %packet.tuple.destination,
                reason,
                %now,
                "packet dropped"
            );
        }
        if packet.kind == PacketKind::Segment {
            self.scheduler
                .schedule(now + RETRANSMIT_TIMEOUT, Event::Retransmit(packet));
        }
    }

    // -- end of run --

    fn log_app_summary(&self) {
        for (idx, app) in self.apps.iter().enumerate() {
            match &app.kind {
                AppKind::Sink { port, received_bytes, .. } => {
                    debug!(app = idx, node = %app.node, port, received_bytes, "sink finished");
                }
                AppKind::EchoServer { port, echoed } => {
                    debug!(app = idx, node = %app.node, port, echoed, "echo server finished");
                }
                AppKind::EchoClient { sent, .. } => {
                    debug!(app = idx, node = %app.node, sent, "echo client finished");
                }
                AppKind::OnOff { .. } => {}
            }
        }
    }

    fn flush_captures(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create capture dir {}", dir.display()))?;
        for (node_idx, node) in self.nodes.iter().enumerate() {
            for (dev_idx, device) in node.devices.iter().enumerate() {
                for capture in &self.devices[device.0 as usize].captures {
                    let path = capture.write(dir, node_idx as u32, dev_idx)?;
                    debug!(path = %path.display(), packets = capture.len(), "wrote capture");
                }
            }
        }
        Ok(())
    }
}

impl SimEngine for PacketSim {
    fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        debug!(seed, "seeded random source");
    }

    fn set_stream_defaults(&mut self, defaults: &StreamDefaults) -> Result<()> {
        self.ensure_live()?;
        ensure!(
            !defaults.socket_type.is_empty(),
            "empty stream socket type"
        );
        ensure!(defaults.segment_size > 0, "segment size must be > 0");
        self.stream = defaults.clone();
        debug!(
            socket_type = %defaults.socket_type,
            segment_size = defaults.segment_size,
            "stream defaults set"
        );
        Ok(())
    }

    fn enable_diagnostics(&mut self, component: &str) {
        if !self.diagnostics.iter().any(|c| c == component) {
            self.diagnostics.push(component.to_string());
        }
    }

    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>> {
        self.ensure_live()?;
        ensure!(count > 0, "node count must be > 0");
        let first = self.nodes.len() as u32;
        self.nodes.extend((0..count).map(|_| NodeState {
            devices: SmallVec::new(),
            stack: false,
            next_port: FIRST_EPHEMERAL_PORT,
        }));
        debug!(count, "created nodes");
        Ok((first..first + count as u32).map(NodeId).collect())
    }

    fn create_link(&mut self, a: NodeId, b: NodeId) -> Result<LinkId> {
        self.ensure_live()?;
        self.node_state(a)?;
        self.node_state(b)?;
        ensure!(a != b, "cannot link {a} to itself");
        let id = LinkId(self.links.len() as u32);
        self.links.push(LinkState { a, b, devices: None });
        Ok(id)
    }

    fn install_point_to_point(
        &mut self,
        link: LinkId,
        config: &PointToPointConfig,
    ) -> Result<DevicePair> {
        self.ensure_live()?;
        ensure!(config.data_rate_bps > 0, "data rate must be > 0");
        ensure!(config.mtu > 0, "MTU must be > 0");
        let first = self.devices.len() as u32;
        let pair = DevicePair(DeviceId(first), DeviceId(first + 1));

        let state = self
            .links
            .get_mut(link.0 as usize)
            .with_context(|| format!("unknown link {}", link.0))?;
        if state.devices.is_some() {
            bail!("link {} already has devices installed", link.0);
        }
        state.devices = Some(pair);
        let (a, b) = (state.a, state.b);

        self.devices.push(Device::new(a, pair.1, config.clone()));
        self.devices.push(Device::new(b, pair.0, config.clone()));
        self.node_state(a)?.devices.push(pair.0);
        self.node_state(b)?.devices.push(pair.1);

        debug!(
            link = link.0,
            %a,
            %b,
            rate_bps = config.data_rate_bps,
            delay_ms = config.delay.as_millis() as u64,
            "installed point-to-point devices"
        );
        Ok(pair)
    }

    fn install_network_stack(&mut self, nodes: &[NodeId]) -> Result<()> {
        self.ensure_live()?;
        for &node in nodes {
            self.node_state(node)?.stack = true;
        }
        debug!(nodes = nodes.len(), "installed network stack");
        Ok(())
    }

    fn assign_subnet(&mut self, devices: DevicePair, subnet: Subnet) -> Result<[Ipv4Addr; 2]> {
        self.ensure_live()?;
        if let Some(existing) = self.subnets.iter().find(|s| s.overlaps(&subnet)) {
            bail!("subnet {subnet} overlaps already assigned {existing}");
        }
        let peer = self.device_mut(devices.0)?.peer;
        ensure!(
            peer == devices.1,
            "{} and {} are not on the same link",
            devices.0,
            devices.1
        );

        let hosts = [
            subnet.host(1).context("subnet has no first host")?,
            subnet.host(2).context("subnet has no second host")?,
        ];
        for (device, addr) in [(devices.0, hosts[0]), (devices.1, hosts[1])] {
            let node = self.device_mut(device)?.node;
            let has_stack = self.node_state(node)?.stack;
            ensure!(has_stack, "{node} has no network stack installed");
            let dev = self.device_mut(device)?;
            if let Some(old) = dev.address {
                bail!("{device} already has address {old}");
            }
            dev.address = Some(addr);
            self.owners.insert(addr, node);
        }
        self.subnets.push(subnet);
        debug!(%subnet, a = %hosts[0], b = %hosts[1], "assigned subnet");
        Ok(hosts)
    }

    fn compute_global_routes(&mut self) -> Result<()> {
        self.ensure_live()?;
        let mut adjacency: Adjacency = vec![SmallVec::new(); self.nodes.len()];
        for (node_idx, node) in self.nodes.iter().enumerate() {
            if !node.stack {
                continue;
            }
            for &device in &node.devices {
                let dev = &self.devices[device.0 as usize];
                let peer = &self.devices[dev.peer.0 as usize];
                let peer_stack = self.nodes[peer.node.0 as usize].stack;
                if dev.address.is_some() && peer.address.is_some() && peer_stack {
                    adjacency[node_idx].push((device, peer.node));
                }
            }
        }
        self.routes = RouteTable::compute(&adjacency);
        debug!(nodes = self.nodes.len(), "computed global routes");
        Ok(())
    }

    fn install_packet_sink(
        &mut self,
        node: NodeId,
        protocol: Protocol,
        port: u16,
        window: AppWindow,
    ) -> Result<AppId> {
        let id = self.install_app(
            node,
            window,
            AppKind::Sink {
                protocol,
                port,
                received_bytes: 0,
            },
        )?;
        debug!(app = id.0, %node, %protocol, port, "installed packet sink");
        Ok(id)
    }

    fn install_on_off(
        &mut self,
        node: NodeId,
        config: &OnOffConfig,
        window: AppWindow,
    ) -> Result<AppId> {
        ensure!(config.data_rate_bps > 0, "on/off data rate must be > 0");
        ensure!(config.packet_size > 0, "on/off packet size must be > 0");
        ensure!(!config.on_time.is_zero(), "on/off ON period must be > 0");
        let id = self.install_app(
            node,
            window,
            AppKind::OnOff {
                config: config.clone(),
                on: false,
                epoch: 0,
            },
        )?;
        debug!(app = id.0, %node, remote = %config.remote, "installed on/off generator");
        Ok(id)
    }

    fn install_echo_server(
        &mut self,
        node: NodeId,
        port: u16,
        window: AppWindow,
    ) -> Result<AppId> {
        let id = self.install_app(node, window, AppKind::EchoServer { port, echoed: 0 })?;
        debug!(app = id.0, %node, port, "installed echo server");
        Ok(id)
    }

    fn install_echo_client(
        &mut self,
        node: NodeId,
        config: &EchoClientConfig,
        window: AppWindow,
    ) -> Result<AppId> {
        ensure!(config.packet_size > 0, "echo packet size must be > 0");
        let id = self.install_app(
            node,
            window,
            AppKind::EchoClient {
                config: config.clone(),
                sent: 0,
            },
        )?;
        debug!(app = id.0, %node, remote = %config.remote, "installed echo client");
        Ok(id)
    }

    fn set_receive_error_model(
        &mut self,
        device: DeviceId,
        model: Arc<RateErrorModel>,
    ) -> Result<()> {
        self.ensure_live()?;
        let rate = model.rate();
        self.device_mut(device)?.error_model = Some(model);
        debug!(%device, rate, "attached receive error model");
        Ok(())
    }

    fn enable_capture(&mut self, label: &str, device: DeviceId, promiscuous: bool) -> Result<()> {
        self.ensure_live()?;
        self.device_mut(device)?
            .captures
            .push(Capture::new(label, promiscuous));
        debug!(%device, label, promiscuous, "enabled capture");
        Ok(())
    }

    fn install_flow_monitor(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.monitor.get_or_insert_with(FlowMonitor::default);
        Ok(())
    }

    fn advance_to(&mut self, stop: SimTime) -> Result<()> {
        self.ensure_live()?;
        if self.routes.is_empty() && !self.nodes.is_empty() {
            warn!("running without computed routes; only local delivery works");
        }
        info!(%stop, pending = self.scheduler.len(), "advancing simulation");

        let mut processed: u64 = 0;
        while let Some((_, event)) = self.scheduler.pop_until(stop) {
            self.dispatch(event);
            processed += 1;
        }
        if !self.scheduler.is_empty() {
            self.scheduler.advance_clock(stop);
        }
        info!(processed, now = %self.scheduler.now(), "simulation finished");

        self.log_app_summary();
        if let Some(dir) = &self.capture_dir {
            self.flush_captures(dir)?;
        }
        Ok(())
    }

    fn collect_flow_counters(&mut self) -> Result<Vec<RawFlowCounters>> {
        self.ensure_live()?;
        self.monitor
            .as_ref()
            .map(FlowMonitor::counters)
            .context("flow monitor not installed")
    }

    fn destroy(&mut self) {
        self.scheduler.clear();
        self.apps.clear();
        self.devices.clear();
        self.nodes.clear();
        self.links.clear();
        self.subnets.clear();
        self.owners.clear();
        self.routes = RouteTable::default();
        self.monitor = None;
        self.destroyed = true;
        debug!("engine destroyed");
    }
}
