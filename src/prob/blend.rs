//! Probability blender.
//!
//! Combines the market-implied, simulated, and orderbook-derived
//! probabilities with weights chosen by liquidity regime, then shifts weight
//! from market to model when the two disagree hard: a liquid market is
//! usually right, but a market that disagrees with the model by a lot is
//! either stale or informed, and the model gets more say.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Weights over {market, sim, orderbook}, each >= 0, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub market: f64,
    pub sim: f64,
    pub orderbook: f64,
}

impl BlendWeights {
    pub fn sum(&self) -> f64 {
        self.market + self.sim + self.orderbook
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlendOutcome {
    pub final_probability: f64,
    pub weights: BlendWeights,
    /// |market - sim|, the headline disagreement measure
    pub disagreement: f64,
}

/// Base weights by liquidity regime.
fn select_weights(total_depth: f64, spread: f64, cfg: &EngineConfig) -> BlendWeights {
    let tight = spread <= cfg.tight_spread;
    let deep = total_depth >= cfg.deep_book_depth;
    if deep && tight {
        BlendWeights { market: 0.50, sim: 0.30, orderbook: 0.20 }
    } else if tight {
        BlendWeights { market: 0.30, sim: 0.35, orderbook: 0.35 }
    } else {
        BlendWeights { market: 0.25, sim: 0.55, orderbook: 0.20 }
    }
}

/// Blend the three probability sources into the final estimate.
pub fn blend_probabilities(
    market_p: f64,
    sim_p: f64,
    orderbook_p: f64,
    total_depth: f64,
    spread: f64,
    cfg: &EngineConfig,
) -> BlendOutcome {
    let mut weights = select_weights(total_depth, spread, cfg);
    let disagreement = (market_p - sim_p).abs();

    if disagreement > cfg.disagreement_shift_threshold {
        // Ramp the shift with the excess disagreement, saturating at the
        // configured maximum and never overdrawing the market weight.
        let excess =
            (disagreement - cfg.disagreement_shift_threshold) / cfg.disagreement_shift_threshold;
        let shift = (cfg.max_weight_shift * excess.min(1.0)).min(weights.market);
        weights.market -= shift;
        weights.sim += shift;
    }

    let final_probability = (weights.market * market_p
        + weights.sim * sim_p
        + weights.orderbook * orderbook_p)
        .clamp(0.0, 1.0);

    BlendOutcome {
        final_probability,
        weights,
        disagreement,
    }
}
