use rustc_hash::FxHashMap;

use crate::engine::{FiveTuple, RawFlowCounters};
use crate::sim::packet::Packet;
use crate::time::SimTime;

/// Five-tuple classifier plus per-flow counters.
///
/// Flow ids are assigned from 1 in order of first transmission.
#[derive(Default)]
pub(crate) struct FlowMonitor {
    ids: FxHashMap<FiveTuple, usize>,
    flows: Vec<RawFlowCounters>,
}

impl FlowMonitor {
    /// Count a packet leaving its originating node.
    pub fn record_tx(&mut self, now: SimTime, packet: &Packet) {
        let flow = self.classify(packet.tuple);
        flow.tx_bytes += u64::from(packet.size);
        flow.tx_packets += 1;
        flow.first_tx.get_or_insert(now);
    }

    /// Count a packet delivered to its destination node.
    pub fn record_rx(&mut self, now: SimTime, packet: &Packet) {
        if let Some(flow) = self.find(&packet.tuple) {
            flow.rx_bytes += u64::from(packet.size);
            flow.rx_packets += 1;
            flow.last_rx = Some(now);
        }
    }

    pub fn record_loss(&mut self, packet: &Packet) {
        if let Some(flow) = self.find(&packet.tuple) {
            flow.lost_packets += 1;
        }
    }

    pub fn counters(&self) -> Vec<RawFlowCounters> {
        self.flows.clone()
    }

    fn classify(&mut self, tuple: FiveTuple) -> &mut RawFlowCounters {
        let next_id = self.flows.len();
        let idx = *self.ids.entry(tuple).or_insert(next_id);
        if idx == next_id {
            self.flows.push(RawFlowCounters {
                flow_id: next_id as u32 + 1,
                tuple,
                tx_bytes: 0,
                rx_bytes: 0,
                tx_packets: 0,
                rx_packets: 0,
                lost_packets: 0,
                first_tx: None,
                last_rx: None,
            });
        }
        &mut self.flows[idx]
    }

    fn find(&mut self, tuple: &FiveTuple) -> Option<&mut RawFlowCounters> {
        let idx = *self.ids.get(tuple)?;
        self.flows.get_mut(idx)
    }
}
