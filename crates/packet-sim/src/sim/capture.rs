use std::fmt::Write as _;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::sim::packet::Packet;
use crate::time::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Tx,
    Rx,
}

/// Text trace of the packets seen by one device.
///
/// Non-promiscuous captures keep only packets sourced from or addressed to
/// the device itself; promiscuous ones keep everything crossing it,
/// including transit traffic.
pub(crate) struct Capture {
    pub label: String,
    promiscuous: bool,
    lines: Vec<String>,
}

impl Capture {
    pub fn new(label: &str, promiscuous: bool) -> Self {
        Self {
            label: label.to_string(),
            promiscuous,
            lines: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        now: SimTime,
        direction: Direction,
        device_addr: Option<Ipv4Addr>,
        packet: &Packet,
    ) {
        let t = &packet.tuple;
        if !self.promiscuous {
            let own = match direction {
                Direction::Tx => Some(t.source) == device_addr,
                Direction::Rx => Some(t.destination) == device_addr,
            };
            if !own {
                return;
            }
        }
        let dir = match direction {
            Direction::Tx => "tx",
            Direction::Rx => "rx",
        };
        let mut line = String::with_capacity(80);
        let _ = write!(
            line,
            "{:.9} {dir} {}:{} > {}:{} proto={} len={}",
            now.as_secs_f64(),
            t.source,
            t.source_port,
            t.destination,
            t.destination_port,
            t.protocol,
            packet.size
        );
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Artifact name: `{label}-{node}-{device}.txt`, with `device` the
    /// device's index on its node.
    pub fn file_name(&self, node: u32, device_index: usize) -> String {
        format!("{}-{node}-{device_index}.txt", self.label)
    }

    pub fn write(&self, dir: &Path, node: u32, device_index: usize) -> Result<PathBuf> {
        let path = dir.join(self.file_name(node, device_index));
        let mut body = self.lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        std::fs::write(&path, body).with_context(|| format!("write capture {}", path.display()))?;
        Ok(path)
    }
}
