//! Experiment harness for a fixed eight-node point-to-point testbed.
//!
//! The harness builds the topology on a [`packet_sim::SimEngine`], places
//! stream and datagram flows between nodes, attaches a shared fault model
//! to chosen links, enables per-link captures and finally runs the engine
//! to a fixed stop time, reducing its counters into per-flow reports.

// Use mimalloc as the global allocator for tests (non-Windows only)
#[cfg(not(windows))]
#[cfg(test)]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod controller;
pub mod error;
pub mod experiments;
pub mod report;
pub mod scenario;
pub mod topology;
pub mod traffic;
pub mod transport;

#[cfg(test)]
pub mod tests;

pub use config::{DEFAULT_SEED, NetworkParameters};
pub use controller::{ExperimentController, HarnessOptions, RUN_STOP_SECS};
pub use error::{Error, Result};
pub use experiments::Experiment;
pub use report::{FlowReportEntry, ReportSummary, RunReport};
pub use scenario::Scenario;
pub use topology::{Link, LinkName, NODE_COUNT, Topology};
pub use traffic::{PlacementId, TrafficRequest, TransportKind};
pub use transport::StreamTransport;
