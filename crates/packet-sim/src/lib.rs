//! Discrete-event packet network simulation.
//!
//! A small, deterministic engine for point-to-point IPv4 topologies, driven
//! through the [`SimEngine`] trait.
//!
//! # Modules
//!
//! - [`engine`]: The control surface (nodes, links, apps, flow counters)
//! - [`sim`]: [`PacketSim`], the in-process implementation
//! - [`topology`]: Node/link/device handles, link attributes and subnets
//! - [`impairment`]: Receive error models
//! - [`scheduler`]: Time-ordered event queue
//! - [`time`]: Simulated clock
//! - [`test_util`]: Recording engine for harness tests

pub mod engine;
pub mod impairment;
pub mod scheduler;
pub mod sim;
#[cfg(any(test, feature = "test-internals"))]
pub mod test_util;
pub mod time;
pub mod topology;

pub use engine::{
    AppId, AppWindow, EchoClientConfig, FiveTuple, OnOffConfig, Protocol, RawFlowCounters,
    SimEngine, StreamDefaults,
};
pub use impairment::{ErrorUnit, RateErrorModel};
pub use sim::PacketSim;
pub use time::SimTime;
pub use topology::{DeviceId, DevicePair, LinkId, NodeId, PointToPointConfig, Subnet};
