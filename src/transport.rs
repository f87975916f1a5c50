//! Congestion-control selector for reliable-stream sockets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stream transport implementation applied to every node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamTransport {
    NewReno,
    Reno,
    #[default]
    LinuxReno,
    Westwood,
    Vegas,
    Cubic,
    Bic,
    HighSpeed,
    Hybla,
    Veno,
    Illinois,
    Ledbat,
    Scalable,
    Dctcp,
    Bbr,
}

impl StreamTransport {
    pub const ALL: [StreamTransport; 15] = [
        StreamTransport::NewReno,
        StreamTransport::Reno,
        StreamTransport::LinuxReno,
        StreamTransport::Westwood,
        StreamTransport::Vegas,
        StreamTransport::Cubic,
        StreamTransport::Bic,
        StreamTransport::HighSpeed,
        StreamTransport::Hybla,
        StreamTransport::Veno,
        StreamTransport::Illinois,
        StreamTransport::Ledbat,
        StreamTransport::Scalable,
        StreamTransport::Dctcp,
        StreamTransport::Bbr,
    ];

    /// Socket type name handed to the engine.
    pub const fn type_name(self) -> &'static str {
        match self {
            StreamTransport::NewReno => "TcpNewReno",
            StreamTransport::Reno => "TcpReno",
            StreamTransport::LinuxReno => "TcpLinuxReno",
            StreamTransport::Westwood => "TcpWestwood",
            StreamTransport::Vegas => "TcpVegas",
            StreamTransport::Cubic => "TcpCubic",
            StreamTransport::Bic => "TcpBic",
            StreamTransport::HighSpeed => "TcpHighSpeed",
            StreamTransport::Hybla => "TcpHybla",
            StreamTransport::Veno => "TcpVeno",
            StreamTransport::Illinois => "TcpIllinois",
            StreamTransport::Ledbat => "TcpLedbat",
            StreamTransport::Scalable => "TcpScalable",
            StreamTransport::Dctcp => "TcpDctcp",
            StreamTransport::Bbr => "TcpBbr",
        }
    }

    /// Command-line name, e.g. `linux-reno`.
    pub const fn name(self) -> &'static str {
        match self {
            StreamTransport::NewReno => "new-reno",
            StreamTransport::Reno => "reno",
            StreamTransport::LinuxReno => "linux-reno",
            StreamTransport::Westwood => "westwood",
            StreamTransport::Vegas => "vegas",
            StreamTransport::Cubic => "cubic",
            StreamTransport::Bic => "bic",
            StreamTransport::HighSpeed => "high-speed",
            StreamTransport::Hybla => "hybla",
            StreamTransport::Veno => "veno",
            StreamTransport::Illinois => "illinois",
            StreamTransport::Ledbat => "ledbat",
            StreamTransport::Scalable => "scalable",
            StreamTransport::Dctcp => "dctcp",
            StreamTransport::Bbr => "bbr",
        }
    }
}

impl fmt::Display for StreamTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StreamTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamTransport::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("invalid transport '{s}'"))
    }
}

impl clap::ValueEnum for StreamTransport {
    fn value_variants<'a>() -> &'a [Self] {
        &StreamTransport::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_default() {
        assert_eq!(StreamTransport::default(), StreamTransport::LinuxReno);
        assert_eq!(StreamTransport::default().type_name(), "TcpLinuxReno");
    }

    #[test]
    fn test_transport_from_str() {
        assert_eq!(
            "westwood".parse::<StreamTransport>().unwrap(),
            StreamTransport::Westwood
        );
        assert_eq!(
            "high-speed".parse::<StreamTransport>().unwrap(),
            StreamTransport::HighSpeed
        );
        assert!("TcpCubic".parse::<StreamTransport>().is_err());
    }

    #[test]
    fn test_transport_names_are_unique() {
        for (i, a) in StreamTransport::ALL.iter().enumerate() {
            for b in &StreamTransport::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
                assert_ne!(a.type_name(), b.type_name());
            }
        }
    }

    #[test]
    fn test_transport_serde_matches_cli_name() {
        for transport in StreamTransport::ALL {
            let json = serde_json::to_string(&transport).unwrap();
            assert_eq!(json, format!("\"{}\"", transport.name()));
        }
    }
}
