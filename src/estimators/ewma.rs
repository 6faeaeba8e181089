//! EWMA volatility estimation.
//!
//! Exponentially weighted variance of log returns,
//! `var_t = lambda * var_{t-1} + (1 - lambda) * r_t^2`, seeded with the
//! first squared return. The estimate is not trusted until a minimum
//! sample count is reached; before that callers substitute the configured
//! default annualized vol via [`EwmaState::effective_annual_vol`].

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::VolRegime;

/// State of the EWMA variance recursion over one return series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EwmaState {
    /// Per-sample variance (not annualized)
    pub variance: f64,
    /// Annualized volatility, 0 until calibrated
    pub annualized_vol: f64,
    pub regime: VolRegime,
    pub sample_count: usize,
    /// True once `min_calibration_samples` returns have been absorbed
    pub calibrated: bool,
}

impl EwmaState {
    /// Annualized vol to use downstream: the estimate once calibrated, the
    /// configured default otherwise.
    pub fn effective_annual_vol(&self, cfg: &EngineConfig) -> f64 {
        if self.calibrated {
            self.annualized_vol
        } else {
            cfg.default_annual_vol
        }
    }
}

/// Run the EWMA recursion over the full return series.
pub fn estimate_ewma(returns: &[f64], cfg: &EngineConfig) -> EwmaState {
    let mut variance: Option<f64> = None;
    for &r in returns {
        let sq = r * r;
        variance = Some(match variance {
            Some(prev) => cfg.ewma_lambda * prev + (1.0 - cfg.ewma_lambda) * sq,
            None => sq, // seed with the first squared return
        });
    }

    let sample_count = returns.len();
    let calibrated = sample_count >= cfg.min_calibration_samples;

    let (variance, annualized_vol) = if calibrated {
        let var = variance.unwrap_or(0.0).max(0.0);
        (var, var.sqrt() * cfg.samples_per_year.sqrt())
    } else {
        (0.0, 0.0)
    };

    EwmaState {
        variance,
        annualized_vol,
        regime: classify_vol_regime(annualized_vol, cfg),
        sample_count,
        calibrated,
    }
}

/// Band the annualized vol into Low / Medium / High.
pub fn classify_vol_regime(annualized_vol: f64, cfg: &EngineConfig) -> VolRegime {
    if annualized_vol < cfg.low_vol_threshold {
        VolRegime::Low
    } else if annualized_vol > cfg.high_vol_threshold {
        VolRegime::High
    } else {
        VolRegime::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncalibrated_below_minimum() {
        let cfg = EngineConfig::default();
        let returns = vec![0.001; 5]; // below min_calibration_samples
        let state = estimate_ewma(&returns, &cfg);
        assert!(!state.calibrated);
        assert_eq!(state.variance, 0.0);
        assert_eq!(state.annualized_vol, 0.0);
        // Callers get the configured default instead
        assert!((state.effective_annual_vol(&cfg) - cfg.default_annual_vol).abs() < 1e-12);
    }

    #[test]
    fn test_calibrated_at_minimum() {
        let cfg = EngineConfig::default();
        let returns = vec![0.001; 10];
        let state = estimate_ewma(&returns, &cfg);
        assert!(state.calibrated);
        assert_eq!(state.sample_count, 10);
        assert!(state.annualized_vol > 0.0);
        assert!((state.effective_annual_vol(&cfg) - state.annualized_vol).abs() < 1e-12);
    }

    #[test]
    fn test_ewma_recursion_matches_manual() {
        let cfg = EngineConfig::default();
        let returns = vec![0.002, -0.001, 0.003, 0.0005, -0.002, 0.001, 0.002, -0.0015, 0.001, 0.0025];
        let state = estimate_ewma(&returns, &cfg);

        let mut var = returns[0] * returns[0];
        for &r in &returns[1..] {
            var = cfg.ewma_lambda * var + (1.0 - cfg.ewma_lambda) * r * r;
        }
        assert!(
            (state.variance - var).abs() < 1e-18,
            "recursion mismatch: {} vs {}",
            state.variance,
            var
        );
    }

    #[test]
    fn test_annualization_scale() {
        // Constant 1bp-per-minute returns: per-sample sigma is exactly 1e-4,
        // annualized by sqrt(525600).
        let cfg = EngineConfig::default();
        let returns = vec![1e-4; 50];
        let state = estimate_ewma(&returns, &cfg);
        let expected = 1e-4 * 525_600f64.sqrt();
        assert!(
            (state.annualized_vol - expected).abs() / expected < 1e-9,
            "annualized {} vs expected {}",
            state.annualized_vol,
            expected
        );
    }

    #[test]
    fn test_regime_thresholds() {
        let cfg = EngineConfig::default();
        assert_eq!(classify_vol_regime(0.20, &cfg), VolRegime::Low);
        assert_eq!(classify_vol_regime(0.60, &cfg), VolRegime::Medium);
        assert_eq!(classify_vol_regime(1.10, &cfg), VolRegime::High);
    }

    #[test]
    fn test_higher_moves_higher_vol() {
        let cfg = EngineConfig::default();
        let quiet = estimate_ewma(&vec![5e-5; 30], &cfg);
        let noisy = estimate_ewma(&vec![5e-3; 30], &cfg);
        assert!(
            noisy.annualized_vol > quiet.annualized_vol,
            "noisy {} should exceed quiet {}",
            noisy.annualized_vol,
            quiet.annualized_vol
        );
    }
}
