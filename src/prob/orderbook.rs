//! Orderbook imbalance estimator.
//!
//! Depth imbalance between the bid and ask stacks nudges the probability
//! estimate. How hard it is allowed to push (`alpha`) scales with a
//! composite liquidity score: a deep, tight book earns more trust than a
//! thin or wide one.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::OrderbookSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderbookImbalance {
    /// (bid_depth - ask_depth) / (bid_depth + ask_depth), in [-1, 1]
    pub imbalance: f64,
    /// 0.5 + alpha * imbalance, clamped to [0, 1]
    pub probability_adjustment: f64,
    /// Nudge strength, in [0.05, 0.20]
    pub alpha: f64,
    pub total_depth: f64,
    pub spread: f64,
}

impl OrderbookImbalance {
    /// Neutral estimate used when no book is available.
    pub fn neutral() -> Self {
        Self {
            imbalance: 0.0,
            probability_adjustment: 0.5,
            alpha: 0.05,
            total_depth: 0.0,
            spread: 0.0,
        }
    }
}

pub fn estimate_imbalance(book: &OrderbookSnapshot, cfg: &EngineConfig) -> OrderbookImbalance {
    let bid_depth = book.bid_depth();
    let ask_depth = book.ask_depth();
    let total_depth = bid_depth + ask_depth;
    let spread = book.spread();

    let imbalance = if total_depth > 0.0 {
        ((bid_depth - ask_depth) / total_depth).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let depth_score = (total_depth / cfg.reference_depth).min(1.0);
    let spread_score = (1.0 - spread * 10.0).max(0.0);
    let alpha = 0.05 + 0.15 * (0.5 * depth_score + 0.5 * spread_score);

    OrderbookImbalance {
        imbalance,
        probability_adjustment: (0.5 + alpha * imbalance).clamp(0.0, 1.0),
        alpha,
        total_depth,
        spread,
    }
}
