//! Engine facade: owns the per-window session, the RNG, and the recompute
//! boundary.
//!
//! Collaborators push `EngineInput` snapshots via `submit` and drive the
//! engine with `poll`. The forced-commit deadline is checked on every poll,
//! before and independent of the debounce, so a burst of input changes can
//! never talk the engine past the expiry horizon. A panic anywhere in the
//! recompute degrades that cycle to a neutral NoTrade plan instead of
//! poisoning the session.

pub mod plan;
pub mod session;

pub use plan::{assemble_plan, TradePlan};
pub use session::{CommitTrigger, LockedTradePlan, Session, SessionStatus};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::models::{EngineInput, NoTradeReason};

pub struct Engine<C: Clock> {
    cfg: EngineConfig,
    clock: C,
    rng: ChaCha8Rng,
    session: Option<Session>,
    input: Option<EngineInput>,
}

impl<C: Clock> Engine<C> {
    pub fn new(cfg: EngineConfig, clock: C) -> Self {
        Self::with_seed(cfg, clock, rand::random())
    }

    /// Deterministic variant for tests and replays.
    pub fn with_seed(cfg: EngineConfig, clock: C, seed: u64) -> Self {
        Self {
            cfg,
            clock,
            rng: ChaCha8Rng::seed_from_u64(seed),
            session: None,
            input: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn session_status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(|s| s.status())
    }

    pub fn locked_plan(&self) -> Option<&LockedTradePlan> {
        self.session.as_ref().and_then(|s| s.locked())
    }

    /// Accept a fresh input snapshot. A new window id rolls the session;
    /// inputs for the current window restart the debounce timer.
    pub fn submit(&mut self, input: EngineInput) {
        let now_ms = self.clock.now_ms();
        let rolled = self
            .session
            .as_ref()
            .map(|s| s.window_id() != input.window.window_id)
            .unwrap_or(true);
        if rolled {
            info!(window = %input.window.window_id, "new contract window, session reset");
            self.session = Some(Session::new(input.window.window_id.clone(), now_ms));
        }
        if let Some(session) = self.session.as_mut() {
            session.note_input(now_ms);
        }
        self.input = Some(input);
    }

    /// Advance the session: forced-commit check first, then a debounced
    /// recompute. Returns the locked plan on the poll that commits.
    pub fn poll(&mut self) -> Option<LockedTradePlan> {
        let now_ms = self.clock.now_ms();
        let session = self.session.as_mut()?;
        let input = self.input.as_ref()?;

        let secs_to_expiry = input.window.secs_to_expiry(now_ms);
        if session.status() == SessionStatus::Scanning
            && secs_to_expiry <= self.cfg.forced_commit_horizon_secs
        {
            // Nothing tradeable on file: the forced plan is synthesized
            // from whatever the inputs say right now.
            let fallback = if session.best_plan().is_none() {
                Some(guarded_plan(input, now_ms, &self.cfg, &mut self.rng))
            } else {
                None
            };
            let locked =
                session.force_commit_if_due(now_ms, secs_to_expiry, fallback, &self.cfg)?;
            return Some(locked.clone());
        }

        if !session.should_recompute(now_ms, &self.cfg) {
            return None;
        }

        let plan = guarded_plan(input, now_ms, &self.cfg, &mut self.rng);
        session.observe(plan, now_ms, &self.cfg).cloned()
    }
}

/// Recompute boundary: a panic anywhere in the pipeline degrades this cycle
/// to a neutral plan instead of unwinding into the caller.
fn guarded_plan(
    input: &EngineInput,
    now_ms: i64,
    cfg: &EngineConfig,
    rng: &mut ChaCha8Rng,
) -> TradePlan {
    match catch_unwind(AssertUnwindSafe(|| assemble_plan(input, now_ms, cfg, rng))) {
        Ok(plan) => plan,
        Err(_) => {
            error!(window = %input.window.window_id, "recompute panicked, degrading to no-trade");
            TradePlan::no_trade(NoTradeReason::InternalError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{BookLevel, ContractWindow, OrderbookSnapshot, PriceTick, QuoteSnapshot};
    use chrono::{TimeZone, Utc};

    const START_S: i64 = 1_700_000_000;

    fn window(id: &str) -> ContractWindow {
        ContractWindow {
            window_id: id.to_string(),
            strike: 100.0,
            start: Utc.timestamp_opt(START_S, 0).unwrap(),
            end: Utc.timestamp_opt(START_S + 900, 0).unwrap(),
        }
    }

    fn input(id: &str) -> EngineInput {
        let ticks = (0..15)
            .map(|i| PriceTick {
                ts_ms: (START_S - 900 + i * 60) * 1000,
                close: 100.0 + 0.01 * ((i % 2) as f64),
            })
            .collect();
        EngineInput {
            ticks,
            quote: Some(QuoteSnapshot {
                yes_bid: 0.49,
                yes_ask: 0.51,
                no_bid: 0.47,
                no_ask: 0.49,
                last_trade: None,
            }),
            book: Some(OrderbookSnapshot {
                bids: vec![BookLevel { price: 0.49, size: 60.0 }],
                asks: vec![BookLevel { price: 0.51, size: 60.0 }],
            }),
            window: window(id),
        }
    }

    fn engine(clock: ManualClock) -> Engine<ManualClock> {
        let cfg = EngineConfig {
            num_paths: 5_000,
            ..Default::default()
        };
        Engine::with_seed(cfg, clock, 7)
    }

    #[test]
    fn test_poll_without_input_is_idle() {
        let clock = ManualClock::new(START_S * 1000);
        let mut e = engine(clock);
        assert!(e.poll().is_none());
        assert!(e.session_status().is_none());
    }

    #[test]
    fn test_debounce_defers_the_recompute() {
        let clock = ManualClock::new((START_S + 60) * 1000);
        let mut e = engine(clock.clone());
        e.submit(input("w1"));
        assert!(e.poll().is_none(), "inside the debounce window");
        assert_eq!(e.session_status(), Some(SessionStatus::Scanning));

        clock.advance(600);
        e.poll();
        // Quiet fairly-priced market: scanned but not committed
        assert_eq!(e.session_status(), Some(SessionStatus::Scanning));
    }

    #[test]
    fn test_window_rollover_resets_session() {
        let clock = ManualClock::new((START_S + 60) * 1000);
        let mut e = engine(clock.clone());
        e.submit(input("w1"));
        clock.advance(600);
        e.poll();
        assert_eq!(e.session_status(), Some(SessionStatus::Scanning));

        e.submit(input("w2"));
        assert_eq!(e.session_status(), Some(SessionStatus::Scanning));
        assert!(e.locked_plan().is_none());
        assert_eq!(
            e.session.as_ref().map(|s| s.window_id().to_string()),
            Some("w2".to_string())
        );
    }

    #[test]
    fn test_forced_commit_beats_debounce() {
        // Submit inside the forced horizon, then poll immediately: the
        // deadline check must not wait for quiescence.
        let near_expiry_ms = (START_S + 900 - 60) * 1000;
        let clock = ManualClock::new(near_expiry_ms);
        let mut e = engine(clock.clone());
        e.submit(input("w1"));

        let locked = e.poll().expect("must commit at the deadline");
        assert_eq!(locked.trigger, CommitTrigger::Forced);
        assert_eq!(e.session_status(), Some(SessionStatus::Committed));

        // Once committed the engine stays quiet
        clock.advance(1_000);
        e.submit(input("w1"));
        assert!(e.poll().is_none());
    }
}
