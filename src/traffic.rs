//! Traffic placement requests and the per-transport application setups.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use packet_sim::{AppWindow, EchoClientConfig, NodeId, OnOffConfig, Protocol, SimEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Activity window of every sink and echo responder, in seconds.
pub const LISTEN_WINDOW: (f64, f64) = (1.0, 60.0);

pub const ON_OFF_PACKET_SIZE: u32 = 1500;
pub const ON_TIME: Duration = Duration::from_secs(2);
pub const OFF_TIME: Duration = Duration::from_secs(1);

/// Well-known port every datagram placement targets.
pub const ECHO_PORT: u16 = 9;
pub const ECHO_MAX_PACKETS: u32 = 1000;
pub const ECHO_INTERVAL: Duration = Duration::from_millis(10);
pub const ECHO_PACKET_SIZE: u32 = 1024;

/// How a placement moves its bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// Sink plus ON/OFF generator over the configured stream transport.
    #[serde(rename = "tcp")]
    ReliableStream,
    /// Echo responder plus bounded echo requester.
    #[serde(rename = "udp")]
    Datagram,
}

impl TransportKind {
    /// Report label.
    pub const fn label(self) -> &'static str {
        match self {
            TransportKind::ReliableStream => "TCP",
            TransportKind::Datagram => "UDP",
        }
    }

    /// Classify an IP protocol number from the flow counters.
    pub const fn from_protocol(number: u8) -> Option<Self> {
        match number {
            6 => Some(TransportKind::ReliableStream),
            17 => Some(TransportKind::Datagram),
            _ => None,
        }
    }

    /// Install the destination-side listener and the source-side sender.
    pub(crate) fn install<E: SimEngine>(
        self,
        engine: &mut E,
        route: &Route,
        request: &TrafficRequest,
        on_off_rate_bps: u64,
    ) -> anyhow::Result<()> {
        let listen = AppWindow::from_secs(LISTEN_WINDOW.0, LISTEN_WINDOW.1);
        let active = AppWindow::from_secs(request.start, request.stop);

        match self {
            TransportKind::ReliableStream => {
                engine.install_packet_sink(route.destination, Protocol::Tcp, request.port, listen)?;
                let config = OnOffConfig {
                    protocol: Protocol::Tcp,
                    remote: SocketAddrV4::new(route.address, request.port),
                    data_rate_bps: on_off_rate_bps,
                    packet_size: ON_OFF_PACKET_SIZE,
                    on_time: ON_TIME,
                    off_time: OFF_TIME,
                };
                engine.install_on_off(route.source, &config, active)?;
            }
            TransportKind::Datagram => {
                if request.port != ECHO_PORT {
                    debug!(
                        requested = request.port,
                        used = ECHO_PORT,
                        "datagram placement ignores the requested port"
                    );
                }
                engine.install_echo_server(route.destination, ECHO_PORT, listen)?;
                let config = EchoClientConfig {
                    remote: SocketAddrV4::new(route.address, ECHO_PORT),
                    max_packets: ECHO_MAX_PACKETS,
                    interval: ECHO_INTERVAL,
                    packet_size: ECHO_PACKET_SIZE,
                };
                engine.install_echo_client(route.source, &config, active)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportKind::ReliableStream),
            "udp" => Ok(TransportKind::Datagram),
            _ => Err(format!("invalid transport kind '{s}': use tcp or udp")),
        }
    }
}

impl clap::ValueEnum for TransportKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[TransportKind::ReliableStream, TransportKind::Datagram]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            TransportKind::ReliableStream => Some(clap::builder::PossibleValue::new("tcp")),
            TransportKind::Datagram => Some(clap::builder::PossibleValue::new("udp")),
        }
    }
}

/// A request to run one flow between two nodes.
///
/// `link` names the link whose endpoint-0 address is the destination.
/// Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficRequest {
    pub source: usize,
    pub destination: usize,
    pub link: String,
    pub start: f64,
    pub stop: f64,
    pub kind: TransportKind,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    ECHO_PORT
}

impl TrafficRequest {
    pub fn stream(
        source: usize,
        destination: usize,
        link: &str,
        (start, stop): (f64, f64),
        port: u16,
    ) -> Self {
        Self {
            source,
            destination,
            link: link.to_string(),
            start,
            stop,
            kind: TransportKind::ReliableStream,
            port,
        }
    }

    pub fn datagram(
        source: usize,
        destination: usize,
        link: &str,
        (start, stop): (f64, f64),
        port: u16,
    ) -> Self {
        Self {
            kind: TransportKind::Datagram,
            ..Self::stream(source, destination, link, (start, stop), port)
        }
    }
}

/// Sequence number of an accepted placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlacementId(pub usize);

/// Engine handles a placement resolves to at install time.
pub(crate) struct Route {
    pub source: NodeId,
    pub destination: NodeId,
    pub address: Ipv4Addr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_protocol() {
        assert_eq!(
            TransportKind::from_protocol(6),
            Some(TransportKind::ReliableStream)
        );
        assert_eq!(TransportKind::from_protocol(17), Some(TransportKind::Datagram));
        assert_eq!(TransportKind::from_protocol(1), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "TCP".parse::<TransportKind>().unwrap(),
            TransportKind::ReliableStream
        );
        assert_eq!("udp".parse::<TransportKind>().unwrap(), TransportKind::Datagram);
        assert!("sctp".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_request_from_json() {
        let request: TrafficRequest = serde_json::from_str(
            r#"{"source": 3, "destination": 2, "link": "n2n6", "start": 30, "stop": 60, "kind": "udp"}"#,
        )
        .unwrap();
        assert_eq!(request, TrafficRequest::datagram(3, 2, "n2n6", (30.0, 60.0), 9));
    }
}
