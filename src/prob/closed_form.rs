//! Closed-form digital option pricing.
//!
//! For a binary settle-above-strike payoff under GBM dynamics:
//! `d2 = [ln(S0/K) + (mu - sigma^2/2) T] / (sigma sqrt(T))`,
//! `p_up = Phi(d2)`. Pure function of its inputs, no randomness: identical
//! inputs produce bit-identical output. Serves as the cross-check for the
//! simulator and the fallback when the simulator blows its time budget.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClosedFormResult {
    pub p_up: f64,
    pub p_down: f64,
    pub d2: f64,
}

impl ClosedFormResult {
    fn step(spot: f64, strike: f64) -> Self {
        let p_up = if spot > strike { 1.0 } else { 0.0 };
        Self {
            p_up,
            p_down: 1.0 - p_up,
            d2: if spot > strike { f64::MAX } else { f64::MIN },
        }
    }
}

/// Probability the terminal price exceeds the strike.
///
/// Degenerate sigma or non-positive T collapses to the deterministic step
/// function (the window is effectively settled).
pub fn digital_p_up(spot: f64, strike: f64, mu: f64, sigma: f64, t_years: f64) -> ClosedFormResult {
    if spot <= 0.0 || strike <= 0.0 {
        return ClosedFormResult::step(spot, strike);
    }
    if t_years <= 0.0 || sigma <= 0.0 || !sigma.is_finite() || !t_years.is_finite() {
        return ClosedFormResult::step(spot, strike);
    }

    let vol_sqrt_t = sigma * t_years.sqrt();
    let d2 = ((spot / strike).ln() + (mu - 0.5 * sigma * sigma) * t_years) / vol_sqrt_t;
    if !d2.is_finite() {
        return ClosedFormResult::step(spot, strike);
    }

    let p_up = match Normal::new(0.0, 1.0) {
        Ok(n) => n.cdf(d2).clamp(0.0, 1.0),
        Err(_) => return ClosedFormResult::step(spot, strike),
    };

    ClosedFormResult {
        p_up,
        p_down: 1.0 - p_up,
        d2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_the_money_is_near_half() {
        // mu = 0, S0 = K: d2 = -sigma sqrt(T)/2, just below 0.5
        let r = digital_p_up(100.0, 100.0, 0.0, 0.02, 15.0 / 525_600.0);
        assert!(r.p_up > 0.45 && r.p_up < 0.5, "p_up = {}", r.p_up);
        assert!((r.p_up + r.p_down - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_deep_in_the_money() {
        let r = digital_p_up(110.0, 100.0, 0.0, 0.02, 15.0 / 525_600.0);
        assert!(r.p_up > 0.999, "p_up = {}", r.p_up);
    }

    #[test]
    fn test_deep_out_of_the_money() {
        let r = digital_p_up(90.0, 100.0, 0.0, 0.02, 15.0 / 525_600.0);
        assert!(r.p_up < 0.001, "p_up = {}", r.p_up);
    }

    #[test]
    fn test_settled_window_step_function() {
        let above = digital_p_up(101.0, 100.0, 0.0, 0.02, 0.0);
        assert_eq!(above.p_up, 1.0);
        assert_eq!(above.p_down, 0.0);

        let below = digital_p_up(99.0, 100.0, 0.0, 0.02, 0.0);
        assert_eq!(below.p_up, 0.0);

        // Exactly at the strike settles below per the payoff definition
        let at = digital_p_up(100.0, 100.0, 0.0, 0.02, -1.0);
        assert_eq!(at.p_up, 0.0);
    }

    #[test]
    fn test_zero_sigma_step_function() {
        let r = digital_p_up(101.0, 100.0, 0.0, 0.0, 1.0);
        assert_eq!(r.p_up, 1.0);
    }

    #[test]
    fn test_deterministic_bit_identical() {
        let a = digital_p_up(100.3, 100.0, 0.01, 0.5, 1e-4);
        let b = digital_p_up(100.3, 100.0, 0.01, 0.5, 1e-4);
        assert_eq!(a.p_up.to_bits(), b.p_up.to_bits());
        assert_eq!(a.d2.to_bits(), b.d2.to_bits());
    }

    #[test]
    fn test_positive_drift_raises_p_up() {
        let t = 15.0 / 525_600.0;
        let flat = digital_p_up(100.0, 100.0, 0.0, 0.5, t);
        let drifted = digital_p_up(100.0, 100.0, 50.0, 0.5, t);
        assert!(
            drifted.p_up > flat.p_up,
            "drift should raise p_up: {} vs {}",
            drifted.p_up,
            flat.p_up
        );
    }

    #[test]
    fn test_probability_bounds() {
        for &(s, k, mu, sigma, t) in &[
            (100.0, 100.0, 0.0, 0.02, 1e-5),
            (50.0, 150.0, -10.0, 3.0, 0.1),
            (200.0, 10.0, 10.0, 0.001, 1e-8),
        ] {
            let r = digital_p_up(s, k, mu, sigma, t);
            assert!((0.0..=1.0).contains(&r.p_up), "p_up out of range: {}", r.p_up);
            assert!((r.p_up + r.p_down - 1.0).abs() < 1e-12);
        }
    }
}
