use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use crate::impairment::RateErrorModel;
use crate::sim::capture::{Capture, Direction};
use crate::sim::packet::Packet;
use crate::time::{SimTime, transmission_time};
use crate::topology::{DeviceId, NodeId, PointToPointConfig};

/// Drop-tail limit of each device's transmit queue, in packets.
pub const QUEUE_LIMIT: usize = 100;

/// One end of a point-to-point link.
pub(crate) struct Device {
    pub node: NodeId,
    pub peer: DeviceId,
    pub config: PointToPointConfig,
    pub address: Option<Ipv4Addr>,
    pub error_model: Option<Arc<RateErrorModel>>,
    pub captures: Vec<Capture>,
    queue: VecDeque<Packet>,
    transmitting: Option<Packet>,
}

impl Device {
    pub fn new(node: NodeId, peer: DeviceId, config: PointToPointConfig) -> Self {
        Self {
            node,
            peer,
            config,
            address: None,
            error_model: None,
            captures: Vec::new(),
            queue: VecDeque::new(),
            transmitting: None,
        }
    }

    /// Hand a packet to the device.
    ///
    /// `Ok(Some(t))`: transmission started and completes after `t`.
    /// `Ok(None)`: queued behind the packet on the wire.
    /// `Err(packet)`: the queue is full and the packet is dropped.
    pub fn enqueue(&mut self, now: SimTime, packet: Packet) -> Result<Option<Duration>, Packet> {
        if self.transmitting.is_none() {
            return Ok(Some(self.start(now, packet)));
        }
        if self.queue.len() >= QUEUE_LIMIT {
            return Err(packet);
        }
        self.queue.push_back(packet);
        Ok(None)
    }

    /// Finish the packet on the wire and start the next queued one.
    ///
    /// Returns the finished packet and, if another transmission started,
    /// its serialization time.
    pub fn complete(&mut self, now: SimTime) -> (Option<Packet>, Option<Duration>) {
        let done = self.transmitting.take();
        let next = self.queue.pop_front().map(|p| self.start(now, p));
        (done, next)
    }

    pub fn observe(&mut self, now: SimTime, direction: Direction, packet: &Packet) {
        let address = self.address;
        for capture in &mut self.captures {
            capture.record(now, direction, address, packet);
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn start(&mut self, now: SimTime, packet: Packet) -> Duration {
        self.observe(now, Direction::Tx, &packet);
        let time = transmission_time(packet.size, self.config.data_rate_bps);
        self.transmitting = Some(packet);
        time
    }
}
