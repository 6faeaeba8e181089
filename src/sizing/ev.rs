//! Expected-value gate.
//!
//! Picks the contract side with positive edge and tests whether its expected
//! value clears transaction cost plus a model error margin. For a binary
//! contract bought at price c with win probability p paying $1:
//! `EV = p * (1 - c) - (1 - p) * c`.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{QuoteSnapshot, SignalSide};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvDecision {
    /// Side with positive edge; None when neither side has any
    pub side: Option<SignalSide>,
    /// Estimated probability minus cost on the chosen side (0 if none)
    pub edge: f64,
    pub expected_value: f64,
    /// Price paid for the chosen side
    pub contract_price: f64,
    /// True iff EV > transaction_cost + error_margin
    pub passes: bool,
}

impl EvDecision {
    fn no_signal() -> Self {
        Self {
            side: None,
            edge: 0.0,
            expected_value: 0.0,
            contract_price: 0.0,
            passes: false,
        }
    }
}

/// Expected value of a $1 binary bought at `cost` with win probability `p`.
pub fn expected_value(p: f64, cost: f64) -> f64 {
    p * (1.0 - cost) - (1.0 - p) * cost
}

/// Evaluate both sides at the touch and gate the better one.
pub fn evaluate_ev(final_p: f64, quote: &QuoteSnapshot, cfg: &EngineConfig) -> EvDecision {
    let p = final_p.clamp(0.0, 1.0);

    let yes_cost = quote.cost(SignalSide::Yes);
    let no_cost = quote.cost(SignalSide::No);

    let mut candidates: Vec<(SignalSide, f64, f64)> = Vec::with_capacity(2);
    if yes_cost > 0.0 && yes_cost < 1.0 {
        candidates.push((SignalSide::Yes, p, yes_cost));
    }
    if no_cost > 0.0 && no_cost < 1.0 {
        candidates.push((SignalSide::No, 1.0 - p, no_cost));
    }

    let best = candidates
        .into_iter()
        .map(|(side, prob, cost)| (side, prob - cost, prob, cost))
        .filter(|(_, edge, _, _)| *edge > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1));

    let Some((side, edge, prob, cost)) = best else {
        return EvDecision::no_signal();
    };

    let ev = expected_value(prob, cost);
    EvDecision {
        side: Some(side),
        edge,
        expected_value: ev,
        contract_price: cost,
        passes: ev > cfg.transaction_cost + cfg.error_margin,
    }
}
