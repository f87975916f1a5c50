//! Reduction of raw engine counters into per-flow report entries.

use std::fmt;
use std::net::SocketAddrV4;

use anyhow::anyhow;
use packet_sim::RawFlowCounters;
use serde::Serialize;

use crate::error::Result;
use crate::traffic::TransportKind;
use crate::transport::StreamTransport;

/// Statistics of one unidirectional flow after a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowReportEntry {
    pub flow_id: u32,
    pub kind: TransportKind,
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    /// Seconds; 0 when nothing was sent.
    pub first_tx: f64,
    /// Seconds; 0 when nothing was received.
    pub last_rx: f64,
    /// Mbit/s (2^20 bits per second).
    pub throughput_mbps: f64,
}

impl FlowReportEntry {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Received bits over the active interval, in Mbit/s; 0 if the interval
/// is not positive.
pub fn throughput_mbps(rx_bytes: u64, first_tx: f64, last_rx: f64) -> f64 {
    let active = last_rx - first_tx;
    if active > 0.0 {
        rx_bytes as f64 * 8.0 / active / 1024.0 / 1024.0
    } else {
        0.0
    }
}

/// Turn raw counters into report entries sorted by flow id.
///
/// Fails on protocol numbers other than 6 and 17 and on counters that
/// claim more received than transmitted bytes.
pub fn reduce(raw: &[RawFlowCounters]) -> Result<Vec<FlowReportEntry>> {
    let mut entries = raw
        .iter()
        .map(|flow| -> Result<FlowReportEntry> {
            let t = &flow.tuple;
            let kind = TransportKind::from_protocol(t.protocol).ok_or_else(|| {
                anyhow!("flow {} has unknown protocol {}", flow.flow_id, t.protocol)
            })?;
            if flow.rx_bytes > flow.tx_bytes {
                return Err(anyhow!(
                    "flow {} received {} bytes but sent only {}",
                    flow.flow_id,
                    flow.rx_bytes,
                    flow.tx_bytes
                )
                .into());
            }
            let first_tx = flow.first_tx.map_or(0.0, |t| t.as_secs_f64());
            let last_rx = flow.last_rx.map_or(0.0, |t| t.as_secs_f64());
            Ok(FlowReportEntry {
                flow_id: flow.flow_id,
                kind,
                source: SocketAddrV4::new(t.source, t.source_port),
                destination: SocketAddrV4::new(t.destination, t.destination_port),
                tx_bytes: flow.tx_bytes,
                rx_bytes: flow.rx_bytes,
                lost_packets: flow.lost_packets,
                first_tx,
                last_rx,
                throughput_mbps: throughput_mbps(flow.rx_bytes, first_tx, last_rx),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.flow_id);
    Ok(entries)
}

impl fmt::Display for FlowReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "FlowID: {} ({} {}/{} --> {}/{})",
            self.flow_id,
            self.label(),
            self.source.ip(),
            self.source.port(),
            self.destination.ip(),
            self.destination.port()
        )?;
        writeln!(f, "  Tx Bytes: {}", self.tx_bytes)?;
        writeln!(f, "  Rx Bytes: {}", self.rx_bytes)?;
        writeln!(f, "  Lost Pkt: {}", self.lost_packets)?;
        writeln!(f, "  Flow active: {:.6}s - {:.6}s", self.first_tx, self.last_rx)?;
        write!(f, "  Throughput: {:.6} Mbps", self.throughput_mbps)
    }
}

/// Totals over every entry of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub flows: usize,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    pub mean_throughput_mbps: f64,
}

impl ReportSummary {
    pub fn from_entries(entries: &[FlowReportEntry]) -> Self {
        let mut summary = entries.iter().fold(Self::default(), |mut acc, e| {
            acc.flows += 1;
            acc.tx_bytes += e.tx_bytes;
            acc.rx_bytes += e.rx_bytes;
            acc.lost_packets += e.lost_packets;
            acc.mean_throughput_mbps += e.throughput_mbps;
            acc
        });
        if summary.flows > 0 {
            summary.mean_throughput_mbps /= summary.flows as f64;
        }
        summary
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} flows, {} bytes sent, {} received, {} packets lost, {:.6} Mbps mean",
            self.flows, self.tx_bytes, self.rx_bytes, self.lost_packets, self.mean_throughput_mbps
        )
    }
}

/// Entries of one run plus what produced them.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub name: String,
    pub transport: StreamTransport,
    pub seed: u64,
    pub summary: ReportSummary,
    pub flows: Vec<FlowReportEntry>,
}

impl RunReport {
    pub fn new(
        name: impl Into<String>,
        transport: StreamTransport,
        seed: u64,
        flows: Vec<FlowReportEntry>,
    ) -> Self {
        Self {
            name: name.into(),
            transport,
            seed,
            summary: ReportSummary::from_entries(&flows),
            flows,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== {} ({}, seed {}) =====", self.name, self.transport, self.seed)?;
        for flow in &self.flows {
            writeln!(f, "{flow}")?;
        }
        write!(f, "{}", self.summary)
    }
}
