//! Quantitative signal and position-sizing engine for binary
//! settle-above-strike contracts on short fixed windows.
//!
//! The pipeline: price ticks feed an EWMA volatility estimator, a momentum
//! drift bias, and a regime classifier; a microstructure floor keeps the
//! vol honest near expiry; a regime-mixture Monte Carlo simulator and a
//! closed-form digital price each produce a probability; an orderbook
//! imbalance estimate and the market-implied probability join them in a
//! liquidity-weighted blend; the blended probability runs through an EV
//! gate and a fractional-Kelly sizer; and a per-window session debounces
//! recomputes and commits exactly one plan per contract window.
//!
//! The engine is pure with respect to the outside world: collaborators
//! push `EngineInput` snapshots in and poll `TradePlan`s out. It never
//! fetches market data, never places orders, and never consults an
//! ambient clock (time is injected via [`clock::Clock`]).

pub mod clock;
pub mod config;
pub mod engine;
pub mod estimators;
pub mod models;
pub mod prob;
pub mod sizing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{CommitTrigger, Engine, LockedTradePlan, SessionStatus, TradePlan};
pub use models::{
    ContractWindow, Decision, Direction, EngineInput, NoTradeReason, OrderbookSnapshot, PriceTick,
    QuoteSnapshot, SignalSide,
};
