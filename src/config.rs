//! Construction-time network parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Seed applied to the engine's random source unless overridden.
pub const DEFAULT_SEED: u64 = 42;

pub const DEFAULT_LATENCY_MS: f64 = 1.0;
pub const DEFAULT_RATE_BPS: u64 = 500_000;
pub const DEFAULT_ON_OFF_RATE_BPS: u64 = 300_000;

/// Per-link and per-generator parameters shared by every link.
///
/// Fields are private: build through [`NetworkParameters::new`] or
/// deserialize and then [`NetworkParameters::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkParameters {
    latency_ms: f64,
    rate_bps: u64,
    on_off_rate_bps: u64,
    error_rate: f64,
}

impl Default for NetworkParameters {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_LATENCY_MS,
            rate_bps: DEFAULT_RATE_BPS,
            on_off_rate_bps: DEFAULT_ON_OFF_RATE_BPS,
            error_rate: 0.0,
        }
    }
}

impl NetworkParameters {
    pub fn new(
        latency_ms: f64,
        rate_bps: u64,
        on_off_rate_bps: u64,
        error_rate: f64,
    ) -> Result<Self> {
        let params = Self {
            latency_ms,
            rate_bps,
            on_off_rate_bps,
            error_rate,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            return Err(invalid(format!(
                "latency must be a finite value >= 0 ms, got {}",
                self.latency_ms
            )));
        }
        if self.rate_bps == 0 {
            return Err(invalid("link data rate must be > 0 bps".to_string()));
        }
        if self.on_off_rate_bps == 0 {
            return Err(invalid("generator rate must be > 0 bps".to_string()));
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(invalid(format!(
                "error rate must be within [0, 1], got {}",
                self.error_rate
            )));
        }
        Ok(())
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn latency(&self) -> Duration {
        Duration::from_secs_f64(self.latency_ms / 1000.0)
    }

    pub fn rate_bps(&self) -> u64 {
        self.rate_bps
    }

    pub fn on_off_rate_bps(&self) -> u64 {
        self.on_off_rate_bps
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Whether links can be given a fault model.
    pub fn has_errors(&self) -> bool {
        self.error_rate > 0.0
    }
}

fn invalid(msg: String) -> Error {
    Error::InvalidConfiguration(msg)
}
