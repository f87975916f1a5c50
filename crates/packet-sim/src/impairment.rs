use anyhow::{Result, bail};
use rand::RngExt as _;
use rand::rngs::StdRng;

/// Granularity at which a [`RateErrorModel`] applies its rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorUnit {
    /// Each packet is corrupted with probability `rate`.
    #[default]
    Packet,
    /// Each byte is corrupted with probability `rate`; a packet is lost if
    /// any of its bytes is.
    Byte,
}

/// Receive-side packet error model.
///
/// One instance is typically shared (behind an `Arc`) by every device that
/// attaches it, so all of them drop at the same configured rate. The model
/// itself holds no random state; draws come from the engine's seeded RNG.
#[derive(Debug, Clone, PartialEq)]
pub struct RateErrorModel {
    rate: f64,
    unit: ErrorUnit,
}

impl RateErrorModel {
    pub fn new(rate: f64, unit: ErrorUnit) -> Result<Self> {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            bail!("error rate {rate} outside [0, 1]");
        }
        Ok(Self { rate, unit })
    }

    pub fn per_packet(rate: f64) -> Result<Self> {
        Self::new(rate, ErrorUnit::Packet)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn unit(&self) -> ErrorUnit {
        self.unit
    }

    /// Probability that a packet of `size` bytes is corrupted.
    pub fn loss_probability(&self, size: u32) -> f64 {
        match self.unit {
            ErrorUnit::Packet => self.rate,
            ErrorUnit::Byte => 1.0 - (1.0 - self.rate).powi(size as i32),
        }
    }

    /// Draw once from `rng` and decide whether a packet of `size` bytes is
    /// corrupted.
    pub fn is_corrupt(&self, size: u32, rng: &mut StdRng) -> bool {
        let p = self.loss_probability(size);
        if p <= 0.0 {
            return false;
        }
        rng.random::<f64>() < p
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn rejects_rates_outside_unit_interval() {
        assert!(RateErrorModel::per_packet(-0.1).is_err());
        assert!(RateErrorModel::per_packet(1.5).is_err());
        assert!(RateErrorModel::per_packet(f64::NAN).is_err());
        assert!(RateErrorModel::per_packet(0.0).is_ok());
        assert!(RateErrorModel::per_packet(1.0).is_ok());
    }

    #[test]
    fn byte_unit_compounds_over_packet_size() {
        let model = RateErrorModel::new(0.001, ErrorUnit::Byte).unwrap();
        let p = model.loss_probability(1000);
        assert!(p > 0.6 && p < 0.65, "p = {p}");
    }

    #[test]
    fn zero_rate_never_corrupts() {
        let model = RateErrorModel::per_packet(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..1000).all(|_| !model.is_corrupt(1500, &mut rng)));
    }

    #[test]
    fn drop_fraction_tracks_rate() {
        let model = RateErrorModel::per_packet(0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let drops = (0..10_000).filter(|_| model.is_corrupt(1500, &mut rng)).count();
        assert!((800..1200).contains(&drops), "drops = {drops}");
    }
}
