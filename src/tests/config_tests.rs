#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{DEFAULT_SEED, NetworkParameters};
    use crate::error::Error;

    #[test]
    fn test_params_default() {
        let params = NetworkParameters::default();
        assert_eq!(params.latency_ms(), 1.0);
        assert_eq!(params.rate_bps(), 500_000);
        assert_eq!(params.on_off_rate_bps(), 300_000);
        assert_eq!(params.error_rate(), 0.0);
        assert!(!params.has_errors());
        assert_eq!(DEFAULT_SEED, 42);
    }

    #[test]
    fn test_params_latency_duration() {
        let params = NetworkParameters::new(10.0, 500_000, 300_000, 0.0).unwrap();
        assert_eq!(params.latency(), Duration::from_millis(10));
    }

    #[test]
    fn test_params_validation() {
        for (latency, rate, on_off, error) in [
            (-1.0, 500_000, 300_000, 0.0),
            (f64::NAN, 500_000, 300_000, 0.0),
            (1.0, 0, 300_000, 0.0),
            (1.0, 500_000, 0, 0.0),
            (1.0, 500_000, 300_000, 1.5),
            (1.0, 500_000, 300_000, -0.1),
            (1.0, 500_000, 300_000, f64::NAN),
        ] {
            let err = NetworkParameters::new(latency, rate, on_off, error).unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");
        }
        assert!(NetworkParameters::new(0.0, 1, 1, 1.0).is_ok());
    }

    #[test]
    fn test_params_partial_json() {
        let params: NetworkParameters =
            serde_json::from_str(r#"{"latency_ms": 10, "error_rate": 0.1}"#).unwrap();
        assert_eq!(params.latency_ms(), 10.0);
        assert_eq!(params.rate_bps(), 500_000);
        assert!(params.has_errors());
    }

    #[test]
    fn test_params_reject_unknown_fields() {
        let parsed = serde_json::from_str::<NetworkParameters>(r#"{"latency": 10}"#);
        assert!(parsed.is_err());
    }
}
