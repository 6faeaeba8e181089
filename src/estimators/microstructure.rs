//! Microstructure variance floor.
//!
//! Near expiry the diffusion term sigma^2 * T collapses toward zero, which
//! would force probabilities to 0/1 while bid-ask bounce and execution noise
//! still matter. An irreducible eta^2 term keeps total vol honest:
//! `variance_total = sigma_annual^2 * T + eta^2`, so
//! `sigma_total >= eta` for all T including T = 0.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MicrostructureResult {
    pub sigma_total: f64,
    pub variance_total: f64,
    pub eta: f64,
}

/// Total volatility over the remaining window, floored by the noise term.
pub fn total_volatility(annual_vol: f64, t_years: f64, cfg: &EngineConfig) -> MicrostructureResult {
    let eta = cfg.micro_eta;
    let diffusion = annual_vol * annual_vol * t_years.max(0.0);
    let variance_total = diffusion + eta * eta;
    MicrostructureResult {
        sigma_total: variance_total.sqrt(),
        variance_total,
        eta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_at_zero_time() {
        let cfg = EngineConfig::default();
        let m = total_volatility(0.60, 0.0, &cfg);
        assert!(
            m.sigma_total >= m.eta,
            "sigma_total {} must not drop below eta {}",
            m.sigma_total,
            m.eta
        );
        assert!((m.sigma_total - cfg.micro_eta).abs() < 1e-15);
    }

    #[test]
    fn test_floor_holds_for_negative_time() {
        let cfg = EngineConfig::default();
        let m = total_volatility(0.60, -1.0, &cfg);
        assert!(m.sigma_total >= m.eta);
    }

    #[test]
    fn test_diffusion_dominates_at_long_horizon() {
        let cfg = EngineConfig::default();
        let t = 15.0 / 525_600.0; // 15 minutes in years
        let m = total_volatility(0.60, t, &cfg);
        let diffusion_sigma = 0.60 * t.sqrt();
        assert!(m.sigma_total > diffusion_sigma);
        assert!(m.sigma_total < diffusion_sigma + cfg.micro_eta);
    }

    #[test]
    fn test_variance_is_square() {
        let cfg = EngineConfig::default();
        let m = total_volatility(0.80, 1e-5, &cfg);
        assert!((m.sigma_total * m.sigma_total - m.variance_total).abs() < 1e-15);
    }
}
