//! Canned experiment plans for the testbed.

use std::fmt;

use packet_sim::SimEngine;
use tracing::debug;

use crate::controller::ExperimentController;
use crate::error::Result;
use crate::traffic::TrafficRequest;
use crate::transport::StreamTransport;

/// Window shared by the congestion experiments, in seconds.
const CONGESTION_WINDOW: (f64, f64) = (1.0, 20.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Experiment {
    /// One stream 4 -> 1 through the bottleneck.
    Control,
    /// Two competing streams into node 1.
    Exp1,
    /// Three competing streams into node 1.
    Exp2,
    /// Four competing streams into node 1.
    Exp3,
    /// Two streams plus a datagram flow sharing the core.
    Retransmissions,
    /// A long stream and a late datagram flow on separate sinks.
    Basic,
}

impl Experiment {
    pub const ALL: [Experiment; 6] = [
        Experiment::Control,
        Experiment::Exp1,
        Experiment::Exp2,
        Experiment::Exp3,
        Experiment::Retransmissions,
        Experiment::Basic,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Experiment::Control => "control",
            Experiment::Exp1 => "exp1",
            Experiment::Exp2 => "exp2",
            Experiment::Exp3 => "exp3",
            Experiment::Retransmissions => "retransmissions",
            Experiment::Basic => "basic",
        }
    }

    /// `all` or a single experiment name.
    pub fn parse_selection(s: &str) -> Result<Vec<Experiment>, String> {
        if s == "all" {
            return Ok(Experiment::ALL.to_vec());
        }
        s.parse().map(|e| vec![e])
    }

    pub fn flows(self) -> Vec<TrafficRequest> {
        let w = CONGESTION_WINDOW;
        let into_n1 = |sources: &[usize]| {
            sources
                .iter()
                .zip(8080..)
                .map(|(&src, port)| TrafficRequest::stream(src, 1, "n1n6", w, port))
                .collect::<Vec<_>>()
        };
        match self {
            Experiment::Control => into_n1(&[4]),
            Experiment::Exp1 => into_n1(&[4, 3]),
            Experiment::Exp2 => into_n1(&[4, 3, 0]),
            Experiment::Exp3 => into_n1(&[4, 3, 0, 2]),
            Experiment::Retransmissions => {
                let mut flows = into_n1(&[4, 0]);
                flows.push(TrafficRequest::datagram(3, 2, "n2n6", (10.0, 20.0), 8082));
                flows
            }
            Experiment::Basic => vec![
                TrafficRequest::stream(4, 1, "n1n6", (1.0, 60.0), 8080),
                TrafficRequest::datagram(3, 2, "n2n6", (30.0, 60.0), 9),
            ],
        }
    }

    /// Links captured by this experiment.
    pub fn captures(self) -> &'static [&'static str] {
        match self {
            Experiment::Control => &["n1n6", "n6n7"],
            Experiment::Exp1 => &["n1n6", "n5n7", "n6n7"],
            Experiment::Exp2 | Experiment::Exp3 => &["n1n6", "n5n7", "n5n6", "n6n7"],
            Experiment::Retransmissions => &["n1n6", "n6n7", "n5n6"],
            Experiment::Basic => &["n1n6"],
        }
    }

    /// `{prefix}-{experiment}-{transport}-{link}`.
    pub fn capture_label(self, prefix: &str, transport: StreamTransport, link: &str) -> String {
        format!("{prefix}-{}-{transport}-{link}", self.name())
    }

    /// Place every flow and capture of this experiment on `controller`.
    pub fn apply<E: SimEngine>(
        self,
        controller: &mut ExperimentController<E>,
        prefix: &str,
    ) -> Result<()> {
        let transport = controller.topology().transport();
        for flow in self.flows() {
            controller.place_traffic(flow)?;
        }
        for link in self.captures() {
            let label = self.capture_label(prefix, transport, link);
            controller.toggle_capture(&label, link)?;
        }
        debug!(experiment = self.name(), "experiment applied");
        Ok(())
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Experiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Experiment::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Experiment::ALL.iter().map(|e| e.name()).collect();
                format!("unknown experiment '{s}': use all or one of {}", names.join(", "))
            })
    }
}
