//! Shared utilities for integration tests.
#![allow(dead_code)]

use netlab::{
    DEFAULT_SEED, ExperimentController, FlowReportEntry, NetworkParameters, StreamTransport,
    TrafficRequest,
};
use packet_sim::PacketSim;

pub fn controller(params: NetworkParameters) -> ExperimentController<PacketSim> {
    controller_seeded(params, DEFAULT_SEED)
}

pub fn controller_seeded(params: NetworkParameters, seed: u64) -> ExperimentController<PacketSim> {
    ExperimentController::with_seed(PacketSim::new(), params, StreamTransport::default(), seed)
        .expect("build controller")
}

/// Default parameters with the given link error probability.
pub fn lossy(error_rate: f64) -> NetworkParameters {
    NetworkParameters::new(1.0, 500_000, 300_000, error_rate).expect("valid parameters")
}

/// Stream from node 4 to node 1 across the `n1n6` bottleneck.
pub fn bottleneck_flow() -> TrafficRequest {
    TrafficRequest::stream(4, 1, "n1n6", (1.0, 60.0), 8080)
}

pub fn assert_report_invariants(entries: &[FlowReportEntry]) {
    for entry in entries {
        assert!(
            entry.rx_bytes <= entry.tx_bytes,
            "flow {} received more than it sent",
            entry.flow_id
        );
        if entry.rx_bytes > 0 {
            assert!(
                entry.last_rx >= entry.first_tx,
                "flow {} ends before it starts",
                entry.flow_id
            );
        }
        assert!(entry.throughput_mbps >= 0.0);
    }
}

/// Print entries to stderr for debugging failed assertions.
pub fn dump(entries: &[FlowReportEntry]) {
    for entry in entries {
        eprintln!("{entry}");
    }
}
