//! Monte Carlo terminal-price simulator.
//!
//! Simulates S_T = S0 * exp((mu - sigma^2/2) T + sigma sqrt(T) Z) under a
//! three-regime volatility mixture: path count is allocated to each regime
//! in proportion to the classifier's weight, and each regime scales a
//! convexity-adjusted base vol by its own multiplier. Z is drawn by
//! Box-Muller from uniform(0,1) pairs.
//!
//! Execution time is measured and reported; the caller decides whether the
//! run beat its soft budget (the simulator itself never aborts a run).
//! Histogram construction is a separable presentation step, built only when
//! `collect_histogram` is set.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::estimators::RegimeWeights;

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub spot: f64,
    pub strike: f64,
    /// Annualized drift
    pub drift: f64,
    /// Annualized total vol (already microstructure-floored)
    pub sigma_total: f64,
    /// Time to expiry in years
    pub t_years: f64,
    /// Fraction of the contract window still remaining, in [0, 1]
    pub fraction_remaining: f64,
    pub weights: RegimeWeights,
}

/// One bin of the terminal-price distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub above_strike: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub p_up: f64,
    pub p_down: f64,
    /// Mean of valid terminal prices
    pub mean: f64,
    pub std_dev: f64,
    pub histogram: Option<Vec<HistogramBin>>,
    /// Valid (finite) paths that entered the aggregate
    pub num_paths: usize,
    pub execution_time_ms: f64,
}

impl SimulationResult {
    fn settled(spot: f64, strike: f64, elapsed_ms: f64) -> Self {
        let p_up = if spot > strike { 1.0 } else { 0.0 };
        Self {
            p_up,
            p_down: 1.0 - p_up,
            mean: spot,
            std_dev: 0.0,
            histogram: None,
            num_paths: 0,
            execution_time_ms: elapsed_ms,
        }
    }
}

/// Run the mixture simulation. Non-finite paths are excluded from all
/// aggregates rather than propagated.
pub fn simulate_terminal<R: Rng>(
    params: &SimulationParams,
    cfg: &EngineConfig,
    rng: &mut R,
) -> SimulationResult {
    let start = Instant::now();

    if params.t_years <= 0.0 || params.spot <= 0.0 || params.sigma_total <= 0.0 {
        return SimulationResult::settled(
            params.spot,
            params.strike,
            start.elapsed().as_secs_f64() * 1000.0,
        );
    }

    // Vol steepens as the window runs down: realized short-horizon vol is
    // convex in time-remaining for these contracts.
    let frac_gone = (1.0 - params.fraction_remaining).clamp(0.0, 1.0);
    let sigma_base = params.sigma_total * (1.0 + cfg.vol_convexity * frac_gone * frac_gone);

    let weights = params.weights.normalized();
    let allocations = [
        (weights.low, cfg.regime_vol_multipliers[0]),
        (weights.high, cfg.regime_vol_multipliers[1]),
        (weights.event, cfg.regime_vol_multipliers[2]),
    ];

    let mut above = 0usize;
    let mut valid = 0usize;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut terminals: Option<Vec<f64>> = if cfg.collect_histogram {
        Some(Vec::with_capacity(cfg.num_paths))
    } else {
        None
    };

    let sqrt_t = params.t_years.sqrt();
    for (weight, mult) in allocations {
        let n = (cfg.num_paths as f64 * weight).round() as usize;
        if n == 0 {
            continue;
        }
        let sigma = sigma_base * mult;
        let drift_term = (params.drift - 0.5 * sigma * sigma) * params.t_years;
        let vol_term = sigma * sqrt_t;

        let mut produced = 0usize;
        while produced < n {
            let (z0, z1) = box_muller(rng);
            for z in [z0, z1] {
                if produced >= n {
                    break;
                }
                produced += 1;
                let terminal = params.spot * (drift_term + vol_term * z).exp();
                if !terminal.is_finite() {
                    continue;
                }
                valid += 1;
                if terminal > params.strike {
                    above += 1;
                }
                sum += terminal;
                sum_sq += terminal * terminal;
                if let Some(t) = terminals.as_mut() {
                    t.push(terminal);
                }
            }
        }
    }

    let (p_up, mean, std_dev) = if valid == 0 {
        (0.5, params.spot, 0.0)
    } else {
        let mean = sum / valid as f64;
        let var = (sum_sq / valid as f64 - mean * mean).max(0.0);
        (above as f64 / valid as f64, mean, var.sqrt())
    };

    let histogram = terminals
        .as_deref()
        .map(|t| build_histogram(t, params.strike, cfg.histogram_bins));

    SimulationResult {
        p_up,
        p_down: 1.0 - p_up,
        mean,
        std_dev,
        histogram,
        num_paths: valid,
        execution_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

/// One Box-Muller pair of standard normals. u1 = 0 is rejected (log of zero).
fn box_muller<R: Rng>(rng: &mut R) -> (f64, f64) {
    let mut u1: f64 = rng.gen();
    while u1 <= 0.0 {
        u1 = rng.gen();
    }
    let u2: f64 = rng.gen();
    let radius = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;
    (radius * theta.cos(), radius * theta.sin())
}

/// Fixed-bin histogram over the realized terminal range, expanded by a small
/// margin so the extremes don't sit on bin edges.
fn build_histogram(terminals: &[f64], strike: f64, bins: usize) -> Vec<HistogramBin> {
    if terminals.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &t in terminals {
        lo = lo.min(t);
        hi = hi.max(t);
    }
    let margin = ((hi - lo) * 0.01).max(1e-9);
    let lo = lo - margin;
    let hi = hi + margin;
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &t in terminals {
        let idx = (((t - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = lo + i as f64 * width;
            let upper = lower + width;
            HistogramBin {
                lower,
                upper,
                count,
                above_strike: 0.5 * (lower + upper) > strike,
            }
        })
        .collect()
}
