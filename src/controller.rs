//! Drives one experiment: placements, faults, captures and the run.

use std::sync::Arc;

use packet_sim::{RawFlowCounters, SimEngine, SimTime};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_SEED, NetworkParameters};
use crate::error::{Error, Result};
use crate::report::{self, FlowReportEntry};
use crate::topology::Topology;
use crate::traffic::{PlacementId, Route, TrafficRequest};
use crate::transport::StreamTransport;

/// Hard stop of every run, in seconds. Later flow stop times are cut.
pub const RUN_STOP_SECS: f64 = 60.0;

/// Inputs fixed for the lifetime of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HarnessOptions {
    pub transport: StreamTransport,
    pub seed: u64,
    /// Forward a diagnostic-logging request for the transport to the engine.
    pub verbose: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            transport: StreamTransport::default(),
            seed: DEFAULT_SEED,
            verbose: false,
        }
    }
}

pub struct ExperimentController<E: SimEngine> {
    engine: E,
    topology: Topology,
    params: NetworkParameters,
    placements: Vec<TrafficRequest>,
}

impl<E: SimEngine> ExperimentController<E> {
    pub fn new(engine: E, params: NetworkParameters, transport: StreamTransport) -> Result<Self> {
        Self::with_options(
            engine,
            params,
            HarnessOptions {
                transport,
                ..HarnessOptions::default()
            },
        )
    }

    pub fn with_seed(
        engine: E,
        params: NetworkParameters,
        transport: StreamTransport,
        seed: u64,
    ) -> Result<Self> {
        Self::with_options(
            engine,
            params,
            HarnessOptions {
                transport,
                seed,
                verbose: false,
            },
        )
    }

    /// Build the topology on `engine`. The engine is destroyed if that
    /// fails.
    pub fn with_options(
        mut engine: E,
        params: NetworkParameters,
        options: HarnessOptions,
    ) -> Result<Self> {
        params.validate()?;
        if options.verbose {
            engine.enable_diagnostics(options.transport.type_name());
        }
        let topology = match Topology::build(&mut engine, &params, options.transport, options.seed)
        {
            Ok(topology) => topology,
            Err(e) => {
                engine.destroy();
                return Err(e);
            }
        };
        Ok(Self {
            engine,
            topology,
            params,
            placements: Vec::new(),
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn params(&self) -> &NetworkParameters {
        &self.params
    }

    /// Requests accepted so far, indexed by [`PlacementId`].
    pub fn placements(&self) -> &[TrafficRequest] {
        &self.placements
    }

    /// Install the applications for one flow.
    ///
    /// The destination address is the endpoint-0 address of `request.link`.
    pub fn place_traffic(&mut self, request: TrafficRequest) -> Result<PlacementId> {
        let source = self.topology.node(request.source)?;
        let destination = self.topology.node(request.destination)?;
        if request.source == request.destination {
            return Err(Error::InvalidPlacement(format!(
                "node {} cannot send to itself",
                request.source
            )));
        }
        let window_ok = request.start.is_finite()
            && request.stop.is_finite()
            && request.start >= 0.0
            && request.start < request.stop;
        if !window_ok {
            return Err(Error::InvalidPlacement(format!(
                "flow window [{}, {}] must satisfy 0 <= start < stop",
                request.start, request.stop
            )));
        }
        if request.stop > RUN_STOP_SECS {
            warn!(
                stop = request.stop,
                limit = RUN_STOP_SECS,
                "flow stop time exceeds run length; it will be truncated"
            );
        }

        let route = Route {
            source,
            destination,
            address: self.topology.address_of(&request.link, 0)?,
        };
        request.kind.install(
            &mut self.engine,
            &route,
            &request,
            self.params.on_off_rate_bps(),
        )?;

        let id = PlacementId(self.placements.len());
        debug!(
            placement = id.0,
            kind = %request.kind,
            src = request.source,
            dst = request.destination,
            address = %route.address,
            start = request.start,
            stop = request.stop,
            "placed traffic"
        );
        self.placements.push(request);
        Ok(id)
    }

    /// Bind the shared fault model to the receiving device of `link`.
    pub fn attach_fault(&mut self, link: &str) -> Result<()> {
        let Some(model) = self.topology.fault_model().cloned() else {
            return Err(Error::InvalidConfiguration(format!(
                "error rate is {}; no fault model to attach to {link}",
                self.params.error_rate()
            )));
        };
        let entry = self.topology.link_mut(link)?;
        let device = entry.receiving_device();
        self.engine
            .set_receive_error_model(device, Arc::clone(&model))?;
        entry.set_fault(model);
        debug!(link, %device, rate = self.params.error_rate(), "attached fault");
        Ok(())
    }

    /// Capture everything seen by the endpoint-0 device of `link`.
    pub fn toggle_capture(&mut self, label: &str, link: &str) -> Result<()> {
        let device = self.topology.link(link)?.devices().0;
        self.engine.enable_capture(label, device, true)?;
        debug!(label, link, %device, "enabled capture");
        Ok(())
    }

    /// Run to [`RUN_STOP_SECS`] and reduce the flow counters.
    ///
    /// The engine is torn down whether or not the run succeeds.
    pub fn run(mut self) -> Result<Vec<FlowReportEntry>> {
        info!(
            placements = self.placements.len(),
            transport = %self.topology.transport(),
            seed = self.topology.seed(),
            "starting run"
        );
        let outcome = self.drive();
        self.engine.destroy();

        let entries = report::reduce(&outcome?)?;
        info!(flows = entries.len(), "run finished");
        Ok(entries)
    }

    fn drive(&mut self) -> anyhow::Result<Vec<RawFlowCounters>> {
        self.engine.install_flow_monitor()?;
        self.engine
            .advance_to(SimTime::from_secs_f64(RUN_STOP_SECS))?;
        self.engine.collect_flow_counters()
    }
}
