//! Trade plan assembly.
//!
//! Runs the full per-tick pipeline (returns, EWMA vol, momentum drift,
//! microstructure floor, regime mixture, Monte Carlo and closed-form
//! probabilities, orderbook imbalance, blending, EV gate, Kelly sizing)
//! and folds the result into one immutable `TradePlan`. Malformed or
//! missing inputs degrade to a neutral NoTrade plan; they never error.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{EngineConfig, SECS_PER_YEAR};
use crate::estimators::{
    detect_regime, estimate_drift, estimate_ewma, log_returns, total_volatility, RegimeWeights,
};
use crate::models::{Decision, Direction, EngineInput, MarketRegime, NoTradeReason, SignalSide};
use crate::prob::{
    blend_probabilities, digital_p_up, estimate_imbalance, simulate_terminal, BlendWeights,
    OrderbookImbalance, SimulationParams,
};
use crate::sizing::{evaluate_ev, kelly_size};

/// The engine's advisory output for one recompute. Immutable once built;
/// the execution layer re-validates everything before acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePlan {
    pub decision: Decision,
    pub direction: Option<Direction>,
    pub final_probability: f64,
    pub market_probability: f64,
    /// Edge on the candidate side, >= 0 (0 when no side qualifies)
    pub edge: f64,
    pub expected_value: f64,
    /// Bankroll fraction from the Kelly sizer
    pub position_size_pct: f64,
    /// Contract price paid on the candidate side
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// 0-100 composite of edge, agreement, and calibration
    pub confidence_score: f64,
    pub no_trade_reason: Option<NoTradeReason>,
    pub regime: MarketRegime,
    /// |market - sim| probability disagreement
    pub disagreement: f64,
    pub regime_weights: RegimeWeights,
    pub blend_weights: BlendWeights,
    pub compute_time_ms: f64,
}

impl TradePlan {
    /// Neutral plan for degraded inputs.
    pub fn no_trade(reason: NoTradeReason) -> Self {
        Self {
            decision: Decision::NoTrade,
            direction: None,
            final_probability: 0.5,
            market_probability: 0.5,
            edge: 0.0,
            expected_value: 0.0,
            position_size_pct: 0.0,
            entry_price: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            confidence_score: 0.0,
            no_trade_reason: Some(reason),
            regime: MarketRegime::LowVol,
            disagreement: 0.0,
            regime_weights: RegimeWeights::SPARSE_DEFAULT,
            blend_weights: BlendWeights { market: 0.0, sim: 1.0, orderbook: 0.0 },
            compute_time_ms: 0.0,
        }
    }

    /// Promote a plan for the forced commit: by the deadline a decision
    /// must exist, so a positive-edge Wait becomes TradeNow, and a plan
    /// that only failed the EV gate trades its thin edge rather than
    /// forfeit the window. Everything else commits as-is.
    pub fn into_forced(mut self) -> Self {
        let gate_failed_with_side =
            self.no_trade_reason == Some(NoTradeReason::GateFailed) && self.direction.is_some();
        if self.decision == Decision::Wait
            || (self.decision == Decision::NoTrade && gate_failed_with_side)
        {
            self.decision = Decision::TradeNow;
            self.no_trade_reason = None;
        }
        self
    }
}

/// Assemble a plan from the current inputs. Total: always returns a plan.
pub fn assemble_plan<R: Rng>(
    input: &EngineInput,
    now_ms: i64,
    cfg: &EngineConfig,
    rng: &mut R,
) -> TradePlan {
    let started = Instant::now();
    let mut plan = compute(input, now_ms, cfg, rng);
    plan.compute_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    plan
}

fn compute<R: Rng>(
    input: &EngineInput,
    now_ms: i64,
    cfg: &EngineConfig,
    rng: &mut R,
) -> TradePlan {
    let window = &input.window;

    let Some(quote) = input.quote else {
        return TradePlan::no_trade(NoTradeReason::MissingData);
    };
    let Some(spot) = input.ticks.last().map(|t| t.close).filter(|c| *c > 0.0) else {
        return TradePlan::no_trade(NoTradeReason::MissingData);
    };

    let market_p = quote.implied_probability();
    let t_secs = window.secs_to_expiry(now_ms);
    let t_years = t_secs / SECS_PER_YEAR;

    // Settled window: the outcome is deterministic, nothing to trade.
    if t_secs <= 0.0 {
        let cf = digital_p_up(spot, window.strike, 0.0, 0.0, 0.0);
        let mut plan = TradePlan::no_trade(NoTradeReason::Expired);
        plan.final_probability = cf.p_up;
        plan.market_probability = market_p;
        return plan;
    }

    // --- Estimation pipeline ---
    let returns = log_returns(&input.ticks);
    let ewma = estimate_ewma(&returns, cfg);
    let drift = estimate_drift(&returns, cfg);
    let regime = detect_regime(&input.ticks, &returns, &ewma, cfg);
    let micro = total_volatility(ewma.effective_annual_vol(cfg), t_years, cfg);
    let mu = drift.annualized(cfg);

    // --- Probability sources ---
    let closed = digital_p_up(spot, window.strike, mu, micro.sigma_total, t_years);

    let sim = simulate_terminal(
        &SimulationParams {
            spot,
            strike: window.strike,
            drift: mu,
            sigma_total: micro.sigma_total,
            t_years,
            fraction_remaining: window.fraction_remaining(now_ms),
            weights: regime.weights,
        },
        cfg,
        rng,
    );

    // Budget check is made fresh every tick: a slow run only disqualifies
    // its own probability, the histogram stays for diagnostics.
    let sim_p = if sim.execution_time_ms > cfg.sim_budget_ms {
        warn!(
            elapsed_ms = sim.execution_time_ms,
            budget_ms = cfg.sim_budget_ms,
            "simulator over budget, falling back to closed form"
        );
        closed.p_up
    } else {
        sim.p_up
    };

    let book_est = match input.book.as_ref() {
        Some(book) => estimate_imbalance(book, cfg),
        None => OrderbookImbalance::neutral(),
    };

    let blend = blend_probabilities(
        market_p,
        sim_p,
        book_est.probability_adjustment,
        book_est.total_depth,
        quote.spread(),
        cfg,
    );

    // --- Gate and size ---
    let ev = evaluate_ev(blend.final_probability, &quote, cfg);

    let position_size_pct = match ev.side {
        Some(side) => {
            kelly_size(side_probability(blend.final_probability, side), ev.contract_price, side, cfg)
                .capped_fraction
        }
        None => 0.0,
    };

    let confidence_score = confidence_score(ev.edge.max(0.0), blend.disagreement, ewma.calibrated);

    let direction = ev.side.map(|s| s.direction());
    let entry_price = ev.contract_price;
    // Take profit at our fair value for the side; stop out when the edge
    // has fully reversed against the entry.
    let fair = ev
        .side
        .map(|s| side_probability(blend.final_probability, s))
        .unwrap_or(0.5);
    let take_profit = fair.clamp(0.01, 0.99);
    let stop_loss = (entry_price - ev.edge.max(0.0)).clamp(0.01, 0.99);

    let mut plan = TradePlan {
        decision: Decision::NoTrade,
        direction,
        final_probability: blend.final_probability,
        market_probability: market_p,
        edge: ev.edge.max(0.0),
        expected_value: ev.expected_value,
        position_size_pct,
        entry_price,
        stop_loss,
        take_profit,
        confidence_score,
        no_trade_reason: None,
        regime: regime.regime,
        disagreement: blend.disagreement,
        regime_weights: regime.weights,
        blend_weights: blend.weights,
        compute_time_ms: 0.0,
    };

    // --- Decision rules, in order ---
    // 1. Model/market disagreement over a deep book: somebody is trading on
    //    information we don't have. Stand down.
    if blend.disagreement > cfg.informed_flow_disagreement
        && book_est.total_depth > cfg.informed_flow_depth
    {
        plan.decision = Decision::NoTrade;
        plan.no_trade_reason = Some(NoTradeReason::InformedFlow);
        return plan;
    }

    // 2. Liquidity floor applies regardless of EV.
    if book_est.total_depth < cfg.min_depth {
        plan.decision = Decision::NoTrade;
        plan.no_trade_reason = Some(NoTradeReason::ThinBook);
        plan.position_size_pct = 0.0;
        return plan;
    }

    // 3. EV gate.
    if ev.side.is_none() || ev.edge <= 0.0 {
        plan.decision = Decision::NoTrade;
        plan.no_trade_reason = Some(NoTradeReason::NoEdge);
        return plan;
    }
    if ev.edge < cfg.min_edge {
        // Real but thin edge: keep scanning, it may widen
        plan.decision = Decision::Wait;
        return plan;
    }
    if !ev.passes {
        plan.decision = Decision::NoTrade;
        plan.no_trade_reason = Some(NoTradeReason::GateFailed);
        return plan;
    }

    plan.decision = Decision::TradeNow;
    debug!(
        window = %window.window_id,
        p = plan.final_probability,
        edge = plan.edge,
        ev = plan.expected_value,
        size_pct = plan.position_size_pct,
        "tradeable plan assembled"
    );
    plan
}

fn side_probability(p_up: f64, side: SignalSide) -> f64 {
    match side {
        SignalSide::Yes => p_up,
        SignalSide::No => 1.0 - p_up,
    }
}

/// 0-100 score: half from edge, a third from market agreement, the rest
/// from estimator calibration.
fn confidence_score(edge: f64, disagreement: f64, calibrated: bool) -> f64 {
    let edge_part = (edge / 0.10).min(1.0);
    let agree_part = 1.0 - (disagreement / 0.20).min(1.0);
    let calib_part = if calibrated { 1.0 } else { 0.5 };
    (100.0 * (0.5 * edge_part + 0.3 * agree_part + 0.2 * calib_part)).clamp(0.0, 100.0)
}
