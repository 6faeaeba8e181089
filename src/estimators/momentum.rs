//! Momentum drift estimator.
//!
//! A conservative continuation bias, not a forecasting model: only when the
//! most recent return is large does any drift survive, and then only a
//! fraction of it.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriftEstimate {
    /// Per-sample drift carried into the simulation, 0 without momentum
    pub adjusted_drift: f64,
    pub has_momentum: bool,
    pub last_return: f64,
}

pub fn estimate_drift(returns: &[f64], cfg: &EngineConfig) -> DriftEstimate {
    let last_return = returns.last().copied().unwrap_or(0.0);
    let has_momentum = last_return.abs() > cfg.momentum_threshold;
    DriftEstimate {
        adjusted_drift: if has_momentum {
            cfg.momentum_beta * last_return
        } else {
            0.0
        },
        has_momentum,
        last_return,
    }
}

impl DriftEstimate {
    /// Annualized drift for use in the exp((mu - sigma^2/2) T) term: the
    /// per-sample continuation extrapolated at the sampling rate.
    pub fn annualized(&self, cfg: &EngineConfig) -> f64 {
        self.adjusted_drift * cfg.samples_per_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_momentum_below_threshold() {
        let cfg = EngineConfig::default();
        let d = estimate_drift(&[0.01, -0.002, 0.001], &cfg);
        assert!(!d.has_momentum);
        assert_eq!(d.adjusted_drift, 0.0);
        assert!((d.last_return - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_momentum_above_threshold() {
        let cfg = EngineConfig::default();
        let d = estimate_drift(&[0.0001, 0.002], &cfg);
        assert!(d.has_momentum);
        assert!((d.adjusted_drift - 0.001).abs() < 1e-15); // beta = 0.5
    }

    #[test]
    fn test_momentum_negative_return() {
        let cfg = EngineConfig::default();
        let d = estimate_drift(&[-0.004], &cfg);
        assert!(d.has_momentum);
        assert!(d.adjusted_drift < 0.0);
    }

    #[test]
    fn test_empty_returns() {
        let cfg = EngineConfig::default();
        let d = estimate_drift(&[], &cfg);
        assert!(!d.has_momentum);
        assert_eq!(d.adjusted_drift, 0.0);
        assert_eq!(d.last_return, 0.0);
    }

    #[test]
    fn test_annualized_scale() {
        let cfg = EngineConfig::default();
        let d = estimate_drift(&[0.002], &cfg);
        assert!((d.annualized(&cfg) - 0.001 * cfg.samples_per_year).abs() < 1e-9);
    }
}
