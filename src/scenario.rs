//! JSON scenario files: parameters plus a list of placements, faults and
//! captures to replay on a controller.

use std::path::Path;

use packet_sim::SimEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NetworkParameters;
use crate::controller::{ExperimentController, HarnessOptions};
use crate::error::{Error, Result};
use crate::traffic::TrafficRequest;
use crate::transport::StreamTransport;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureRequest {
    pub label: String,
    pub link: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub name: Option<String>,
    pub params: NetworkParameters,
    pub transport: StreamTransport,
    pub seed: Option<u64>,
    pub flows: Vec<TrafficRequest>,
    /// Links whose receiving device gets the shared fault model.
    pub faults: Vec<String>,
    pub captures: Vec<CaptureRequest>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_json::from_str(text).map_err(|e| Error::Scenario(e.to_string()))?;
        scenario.params.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Scenario(format!("read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Harness options for this scenario; `fallback_seed` is used when the
    /// file carries none.
    pub fn options(&self, fallback_seed: u64, verbose: bool) -> HarnessOptions {
        HarnessOptions {
            transport: self.transport,
            seed: self.seed.unwrap_or(fallback_seed),
            verbose,
        }
    }

    /// Replay faults, then flows, then captures. Stops at the first error.
    pub fn apply<E: SimEngine>(&self, controller: &mut ExperimentController<E>) -> Result<()> {
        for link in &self.faults {
            controller.attach_fault(link)?;
        }
        for flow in &self.flows {
            controller.place_traffic(flow.clone())?;
        }
        for capture in &self.captures {
            controller.toggle_capture(&capture.label, &capture.link)?;
        }
        debug!(
            faults = self.faults.len(),
            flows = self.flows.len(),
            captures = self.captures.len(),
            "scenario applied"
        );
        Ok(())
    }
}
