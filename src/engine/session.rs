//! Per-window commitment session.
//!
//! One `Session` tracks one contract window from first sight to commitment.
//! While scanning it debounces recomputes (inputs settle before we spend a
//! simulation on them) and keeps the best TradeNow plan seen so far, ranked
//! by expected value. The session commits exactly once, either early when a
//! plan's EV clears the early-commit bar, or at the forced horizon when the
//! window is close enough to expiry that waiting longer forfeits the trade.
//! After commitment the plan is locked and further inputs are ignored.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::engine::plan::TradePlan;
use crate::models::{Decision, NoTradeReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Scanning,
    Committed,
}

/// What tripped the commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitTrigger {
    /// A plan cleared the early-commit EV bar
    EarlyEv,
    /// Expiry horizon reached; best plan seen was locked
    Forced,
}

/// A committed plan, frozen with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedTradePlan {
    pub window_id: String,
    pub plan: TradePlan,
    pub locked_at_ms: i64,
    pub trigger: CommitTrigger,
}

#[derive(Debug)]
pub struct Session {
    window_id: String,
    status: SessionStatus,
    /// Best TradeNow plan so far, by expected value
    best: Option<TradePlan>,
    locked: Option<LockedTradePlan>,
    /// Last time an input changed (unix millis); drives the debounce
    last_change_ms: i64,
    dirty: bool,
}

impl Session {
    pub fn new(window_id: String, now_ms: i64) -> Self {
        Self {
            window_id,
            status: SessionStatus::Scanning,
            best: None,
            locked: None,
            last_change_ms: now_ms,
            dirty: true, // first input always warrants a compute
        }
    }

    pub fn window_id(&self) -> &str {
        &self.window_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn locked(&self) -> Option<&LockedTradePlan> {
        self.locked.as_ref()
    }

    /// Best TradeNow plan observed while scanning.
    pub fn best_plan(&self) -> Option<&TradePlan> {
        self.best.as_ref()
    }

    /// Register that an input changed. Restarts the quiescence timer.
    pub fn note_input(&mut self, now_ms: i64) {
        if self.status == SessionStatus::Committed {
            return;
        }
        self.dirty = true;
        self.last_change_ms = now_ms;
    }

    /// True when inputs changed and have been quiet for the debounce
    /// interval. Committed sessions never recompute.
    pub fn should_recompute(&self, now_ms: i64, cfg: &EngineConfig) -> bool {
        self.status == SessionStatus::Scanning
            && self.dirty
            && now_ms - self.last_change_ms >= cfg.debounce_ms
    }

    /// Fold a freshly computed plan into the session. Tracks the best
    /// TradeNow plan seen and commits early when one clears the EV bar.
    /// Returns the locked plan if this observation committed.
    pub fn observe(
        &mut self,
        plan: TradePlan,
        now_ms: i64,
        cfg: &EngineConfig,
    ) -> Option<&LockedTradePlan> {
        if self.status == SessionStatus::Committed {
            return None;
        }
        self.dirty = false;

        // Wait and NoTrade plans never enter best-EV tracking; a thin edge
        // at the deadline is handled by the forced-commit fallback instead.
        let tradeable = plan.decision == Decision::TradeNow && plan.expected_value > 0.0;
        if tradeable {
            let better = self
                .best
                .as_ref()
                .map(|b| plan.expected_value > b.expected_value)
                .unwrap_or(true);
            if better {
                self.best = Some(plan.clone());
            }
        }

        if plan.decision == Decision::TradeNow && plan.expected_value > cfg.early_commit_ev {
            return Some(self.commit(plan, now_ms, CommitTrigger::EarlyEv));
        }
        None
    }

    /// Commit the best plan seen once expiry is inside the forced horizon.
    /// With nothing tradeable on file, `fallback` (a plan synthesized from
    /// the current inputs) is committed instead, so the decision is always
    /// explicit. Promotion rules live in [`TradePlan::into_forced`].
    pub fn force_commit_if_due(
        &mut self,
        now_ms: i64,
        secs_to_expiry: f64,
        fallback: Option<TradePlan>,
        cfg: &EngineConfig,
    ) -> Option<&LockedTradePlan> {
        if self.status == SessionStatus::Committed
            || secs_to_expiry > cfg.forced_commit_horizon_secs
        {
            return None;
        }
        let plan = self
            .best
            .take()
            .or(fallback)
            .map(TradePlan::into_forced)
            .unwrap_or_else(|| TradePlan::no_trade(NoTradeReason::NoEdge));
        Some(self.commit(plan, now_ms, CommitTrigger::Forced))
    }

    fn commit(&mut self, plan: TradePlan, now_ms: i64, trigger: CommitTrigger) -> &LockedTradePlan {
        info!(
            window = %self.window_id,
            decision = plan.decision.as_str(),
            ev = plan.expected_value,
            ?trigger,
            "session committed"
        );
        self.status = SessionStatus::Committed;
        self.locked.insert(LockedTradePlan {
            window_id: self.window_id.clone(),
            plan,
            locked_at_ms: now_ms,
            trigger,
        })
    }
}
