use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use netlab::config::{DEFAULT_LATENCY_MS, DEFAULT_ON_OFF_RATE_BPS, DEFAULT_RATE_BPS};
use netlab::{
    DEFAULT_SEED, Experiment, ExperimentController, HarnessOptions, NetworkParameters, RunReport,
    Scenario, StreamTransport, TrafficRequest, TransportKind,
};
use packet_sim::PacketSim;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

// Use mimalloc as the global allocator for the binary (non-Windows only)
#[cfg(not(windows))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Prefix of every capture label written by the CLI.
const CAPTURE_PREFIX: &str = "netlab";

#[derive(Parser, Debug)]
#[command(
    name = "netlab",
    author,
    version,
    disable_version_flag = true,
    about = "Experiment harness for a fixed 8-node point-to-point testbed"
)]
struct Cli {
    /// Print the version and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    print_version: bool,

    /// Per-link propagation delay in milliseconds
    #[arg(long, default_value_t = DEFAULT_LATENCY_MS)]
    latency: f64,
    /// Per-link data rate in bits/second
    #[arg(long, default_value_t = DEFAULT_RATE_BPS)]
    rate: u64,
    /// Stream generator rate in bits/second
    #[arg(long = "on-off-rate", default_value_t = DEFAULT_ON_OFF_RATE_BPS)]
    on_off_rate: u64,
    /// Packet error probability of faulted links, in [0, 1]
    #[arg(long = "error-rate", default_value_t = 0.0)]
    error_rate: f64,
    /// Stream transport; repeat to run once per transport (default: linux-reno)
    #[arg(long = "transport", value_enum)]
    transports: Vec<StreamTransport>,
    /// Seed for the engine's random source
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Debug logging, plus transport diagnostics in the engine
    #[arg(long)]
    verbose: bool,
    /// Directory capture traces are written to
    #[arg(long = "capture-dir")]
    capture_dir: Option<PathBuf>,
    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a canned experiment, or `all` of them
    Experiment { name: String },
    /// Replay a JSON scenario file
    Scenario { path: PathBuf },
    /// Run a single ad-hoc flow
    Flow {
        #[arg(long)]
        src: usize,
        #[arg(long)]
        dst: usize,
        /// Link whose endpoint-0 address is the destination
        #[arg(long)]
        link: String,
        #[arg(long, default_value_t = 1.0)]
        start: f64,
        #[arg(long, default_value_t = 60.0)]
        stop: f64,
        #[arg(long, value_enum, default_value = "tcp")]
        kind: TransportKind,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Attach the fault model to this link (repeatable)
        #[arg(long = "fault")]
        faults: Vec<String>,
        /// Capture on this link (repeatable)
        #[arg(long = "capture")]
        captures: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if args.print_version {
        let version = env!("CARGO_PKG_VERSION");
        let git_hash = env!("GIT_HASH");
        let git_branch = env!("GIT_BRANCH");
        let git_dirty = env!("GIT_DIRTY");

        println!(
            "{} ({}@{}{}) [{}]",
            version,
            git_branch,
            git_hash,
            git_dirty,
            env!("CARGO_PKG_NAME")
        );
        return Ok(());
    }

    let Some(command) = &args.command else {
        bail!("no command given; run with --help for usage");
    };

    let params = NetworkParameters::new(args.latency, args.rate, args.on_off_rate, args.error_rate)
        .context("invalid network parameters")?;
    let transports = if args.transports.is_empty() {
        vec![StreamTransport::default()]
    } else {
        args.transports.clone()
    };

    let mut reports = Vec::new();
    match command {
        Command::Experiment { name } => {
            let experiments = Experiment::parse_selection(name).map_err(anyhow::Error::msg)?;
            for &transport in &transports {
                for &experiment in &experiments {
                    let options = harness_options(&args, transport);
                    let mut controller =
                        ExperimentController::with_options(engine(&args), params, options)?;
                    experiment
                        .apply(&mut controller, CAPTURE_PREFIX)
                        .with_context(|| format!("experiment {experiment} failed to apply"))?;
                    let flows = controller
                        .run()
                        .with_context(|| format!("experiment {experiment} ({transport}) failed"))?;
                    reports.push(RunReport::new(experiment.name(), transport, args.seed, flows));
                }
            }
        }
        Command::Scenario { path } => {
            let scenario = Scenario::load(path)
                .with_context(|| format!("failed to load scenario {}", path.display()))?;
            if !args.transports.is_empty() {
                warn!(
                    transport = %scenario.transport,
                    "scenario file sets the transport; --transport ignored"
                );
            }
            let options = scenario.options(args.seed, args.verbose);
            let mut controller =
                ExperimentController::with_options(engine(&args), scenario.params, options)?;
            scenario.apply(&mut controller)?;
            let flows = controller.run().context("scenario run failed")?;
            let name = scenario
                .name
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            reports.push(RunReport::new(name, options.transport, options.seed, flows));
        }
        Command::Flow {
            src,
            dst,
            link,
            start,
            stop,
            kind,
            port,
            faults,
            captures,
        } => {
            for &transport in &transports {
                let options = harness_options(&args, transport);
                let mut controller =
                    ExperimentController::with_options(engine(&args), params, options)?;
                for fault in faults {
                    controller.attach_fault(fault)?;
                }
                let request = TrafficRequest {
                    source: *src,
                    destination: *dst,
                    link: link.clone(),
                    start: *start,
                    stop: *stop,
                    kind: *kind,
                    port: *port,
                };
                controller.place_traffic(request)?;
                for capture in captures {
                    let label = format!("{CAPTURE_PREFIX}-flow-{transport}-{capture}");
                    controller.toggle_capture(&label, capture)?;
                }
                let flows = controller.run().context("flow run failed")?;
                reports.push(RunReport::new("flow", transport, args.seed, flows));
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
    }
    info!(runs = reports.len(), "done");
    Ok(())
}

fn harness_options(args: &Cli, transport: StreamTransport) -> HarnessOptions {
    HarnessOptions {
        transport,
        seed: args.seed,
        verbose: args.verbose,
    }
}

fn engine(args: &Cli) -> PacketSim {
    match &args.capture_dir {
        Some(dir) => PacketSim::new().with_capture_dir(dir),
        None => PacketSim::new(),
    }
}
