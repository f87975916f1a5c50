use std::net::Ipv4Addr;

use crate::engine::{AppWindow, EchoClientConfig, OnOffConfig, Protocol};
use crate::topology::NodeId;

pub(crate) enum AppKind {
    Sink {
        protocol: Protocol,
        port: u16,
        received_bytes: u64,
    },
    OnOff {
        config: OnOffConfig,
        on: bool,
        /// Bumped on every ON/OFF switch so stale send timers are ignored.
        epoch: u64,
    },
    EchoServer {
        port: u16,
        echoed: u64,
    },
    EchoClient {
        config: EchoClientConfig,
        sent: u32,
    },
}

/// Application bound to a node for its activity window.
pub(crate) struct App {
    pub node: NodeId,
    pub window: AppWindow,
    pub running: bool,
    /// Address and ephemeral port of the active socket, bound at start.
    pub local: Option<(Ipv4Addr, u16)>,
    pub kind: AppKind,
}

impl App {
    pub fn new(node: NodeId, window: AppWindow, kind: AppKind) -> Self {
        Self {
            node,
            window,
            running: false,
            local: None,
            kind,
        }
    }

    /// Whether this app is a listener accepting `protocol` on `port`.
    pub fn listens(&self, protocol: Protocol, port: u16) -> bool {
        if !self.running {
            return false;
        }
        match &self.kind {
            AppKind::Sink { protocol: p, port: q, .. } => *p == protocol && *q == port,
            AppKind::EchoServer { port: q, .. } => protocol == Protocol::Udp && *q == port,
            _ => false,
        }
    }

    /// Remote endpoint an active app sends to, if it is a generator.
    pub fn remote(&self) -> Option<(Ipv4Addr, u16)> {
        match &self.kind {
            AppKind::OnOff { config, .. } => Some((*config.remote.ip(), config.remote.port())),
            AppKind::EchoClient { config, .. } => {
                Some((*config.remote.ip(), config.remote.port()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddrV4;
    use std::time::Duration;

    use super::*;

    #[test]
    fn stopped_listener_does_not_accept() {
        let mut app = App::new(
            NodeId(1),
            AppWindow::from_secs(1.0, 60.0),
            AppKind::Sink { protocol: Protocol::Tcp, port: 8080, received_bytes: 0 },
        );
        assert!(!app.listens(Protocol::Tcp, 8080));
        app.running = true;
        assert!(app.listens(Protocol::Tcp, 8080));
        assert!(!app.listens(Protocol::Udp, 8080));
        assert!(!app.listens(Protocol::Tcp, 8081));
    }

    #[test]
    fn echo_server_is_udp_only() {
        let mut app = App::new(
            NodeId(2),
            AppWindow::from_secs(1.0, 60.0),
            AppKind::EchoServer { port: 9, echoed: 0 },
        );
        app.running = true;
        assert!(app.listens(Protocol::Udp, 9));
        assert!(!app.listens(Protocol::Tcp, 9));
        assert!(app.remote().is_none());
    }

    #[test]
    fn generators_expose_remote() {
        let remote = SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 1), 8080);
        let app = App::new(
            NodeId(4),
            AppWindow::from_secs(1.0, 20.0),
            AppKind::OnOff {
                config: OnOffConfig {
                    protocol: Protocol::Tcp,
                    remote,
                    data_rate_bps: 300_000,
                    packet_size: 1500,
                    on_time: Duration::from_secs(2),
                    off_time: Duration::from_secs(1),
                },
                on: false,
                epoch: 0,
            },
        );
        assert_eq!(app.remote(), Some((*remote.ip(), 8080)));
    }
}
