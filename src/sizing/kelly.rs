//! Kelly Criterion position sizing.
//!
//! f* = (b*p - q) / b with b the payout/cost ratio of the binary contract.
//! The raw fraction is floored at zero, scaled by a fractional multiplier
//! (quarter Kelly by default), haircut when risk:reward is extreme, and
//! clamped to an absolute bankroll ceiling. All knobs live in
//! `EngineConfig` so a conservative 0.5-2% sizing band is a configuration,
//! not a code change.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{ConfidenceLevel, SignalSide};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KellyResult {
    /// p - cost on the sized side
    pub edge: f64,
    /// Uncapped Kelly fraction, >= 0
    pub full_kelly: f64,
    /// Fraction after multiplier, haircut, and ceiling
    pub capped_fraction: f64,
    pub dollar_allocation: f64,
    pub direction: Option<SignalSide>,
    pub confidence: ConfidenceLevel,
    /// True when the risk:reward haircut fired
    pub risk_flag: bool,
}

impl KellyResult {
    fn flat() -> Self {
        Self {
            edge: 0.0,
            full_kelly: 0.0,
            capped_fraction: 0.0,
            dollar_allocation: 0.0,
            direction: None,
            confidence: ConfidenceLevel::Low,
            risk_flag: false,
        }
    }
}

/// Size a position on `side` with win probability `p` at `contract_price`.
pub fn kelly_size(
    p: f64,
    contract_price: f64,
    side: SignalSide,
    cfg: &EngineConfig,
) -> KellyResult {
    if !(0.0..=1.0).contains(&p) || contract_price <= 0.0 || contract_price >= 1.0 {
        return KellyResult::flat();
    }

    let edge = p - contract_price;
    if edge <= 0.0 {
        return KellyResult {
            edge,
            ..KellyResult::flat()
        };
    }

    // Payout odds for a $1 binary: win (1 - c) per c staked
    let b = (1.0 - contract_price) / contract_price;
    let q = 1.0 - p;
    let full_kelly = ((b * p - q) / b).max(0.0);

    let mut fraction = full_kelly * cfg.kelly_cap;
    let risk_flag = b > cfg.rr_haircut_threshold;
    if risk_flag {
        // Long-odds contracts are settled by rare events; halve exposure
        fraction *= cfg.rr_haircut;
    }
    let capped_fraction = fraction.clamp(0.0, cfg.max_position_pct);

    let confidence = if edge >= 0.10 {
        ConfidenceLevel::High
    } else if edge >= 0.05 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    KellyResult {
        edge,
        full_kelly,
        capped_fraction,
        dollar_allocation: capped_fraction * cfg.bankroll,
        direction: Some(side),
        confidence,
        risk_flag,
    }
}
