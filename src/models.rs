//! Core data model for the up/down signal engine.
//!
//! Inputs (price ticks, quote, orderbook, contract window) are provided by
//! external collaborators; the engine never fetches them itself. Outputs
//! (`TradePlan` and friends) live in `crate::engine::plan`.
//!
//! All decision-relevant categories are closed enums so exhaustiveness is
//! checked at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Market Inputs
// ============================================================================

/// A single observed price for the underlying asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Unix timestamp in milliseconds (monotonic per feed contract)
    pub ts_ms: i64,
    /// Close price; must be positive to contribute a log return
    pub close: f64,
}

/// Best bid/ask on both sides of the binary contract plus last trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub yes_bid: f64,
    pub yes_ask: f64,
    pub no_bid: f64,
    pub no_ask: f64,
    pub last_trade: Option<f64>,
}

impl QuoteSnapshot {
    /// Market-implied probability of YES (mid of the YES book).
    pub fn implied_probability(&self) -> f64 {
        (0.5 * (self.yes_bid + self.yes_ask)).clamp(0.01, 0.99)
    }

    /// Cost to take the given side at the touch.
    pub fn cost(&self, side: SignalSide) -> f64 {
        match side {
            SignalSide::Yes => self.yes_ask,
            SignalSide::No => self.no_ask,
        }
    }

    /// Bid-ask spread on the YES side (used as the liquidity spread proxy).
    pub fn spread(&self) -> f64 {
        (self.yes_ask - self.yes_bid).max(0.0)
    }
}

/// One price level of the orderbook.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Orderbook snapshot for the candidate contract.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderbookSnapshot {
    pub fn bid_depth(&self) -> f64 {
        self.bids.iter().map(|l| l.size.max(0.0)).sum()
    }

    pub fn ask_depth(&self) -> f64 {
        self.asks.iter().map(|l| l.size.max(0.0)).sum()
    }

    pub fn total_depth(&self) -> f64 {
        self.bid_depth() + self.ask_depth()
    }

    /// Top-of-book spread, 0 if either side is empty.
    pub fn spread(&self) -> f64 {
        match (self.bids.first(), self.asks.first()) {
            (Some(b), Some(a)) => (a.price - b.price).max(0.0),
            _ => 0.0,
        }
    }
}

/// The binary contract being scanned: settle-above-strike at `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractWindow {
    /// Stable identifier; a change rolls the engine session
    pub window_id: String,
    pub strike: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ContractWindow {
    /// Seconds until expiry from `now_ms` (unix millis); negative if settled.
    pub fn secs_to_expiry(&self, now_ms: i64) -> f64 {
        (self.end.timestamp_millis() - now_ms) as f64 / 1000.0
    }

    /// Fraction of the window still remaining, clamped to [0, 1].
    pub fn fraction_remaining(&self, now_ms: i64) -> f64 {
        let total = (self.end.timestamp_millis() - self.start.timestamp_millis()) as f64;
        if total <= 0.0 {
            return 0.0;
        }
        ((self.end.timestamp_millis() - now_ms) as f64 / total).clamp(0.0, 1.0)
    }
}

/// Everything the engine consumes for one recompute. The window is required
/// (it keys the session); market data is optional and degrades to NoTrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInput {
    pub ticks: Vec<PriceTick>,
    pub quote: Option<QuoteSnapshot>,
    pub book: Option<OrderbookSnapshot>,
    pub window: ContractWindow,
}

// ============================================================================
// Decision Enums
// ============================================================================

/// Terminal decision attached to a trade plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    TradeNow,
    Wait,
    NoTrade,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::TradeNow => "trade_now",
            Decision::Wait => "wait",
            Decision::NoTrade => "no_trade",
        }
    }
}

/// Which contract leg a TradeNow plan buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    LongYes,
    LongNo,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::LongYes => "long_yes",
            Direction::LongNo => "long_no",
        }
    }
}

/// Side of the binary payoff a signal points at. Absence of a signal is
/// represented by `Option::None` at the call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalSide {
    Yes,
    No,
}

impl SignalSide {
    pub fn direction(&self) -> Direction {
        match self {
            SignalSide::Yes => Direction::LongYes,
            SignalSide::No => Direction::LongNo,
        }
    }
}

/// Volatility band from the EWMA estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolRegime {
    Low,
    Medium,
    High,
}

/// Behavioural regime from the mixture classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    LowVol,
    HighVol,
    EventDriven,
}

impl MarketRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRegime::LowVol => "low_vol",
            MarketRegime::HighVol => "high_vol",
            MarketRegime::EventDriven => "event_driven",
        }
    }
}

/// Confidence tier attached to a sized position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Why a plan declined to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoTradeReason {
    /// Price history, quote, or book absent/unusable
    MissingData,
    /// Window already settled (time to expiry <= 0)
    Expired,
    /// Model/market disagreement over a deep book: somebody knows something
    InformedFlow,
    /// Orderbook depth below the liquidity floor
    ThinBook,
    /// No side carries positive edge
    NoEdge,
    /// Positive edge but expected value fails the cost+margin gate
    GateFailed,
    /// Recompute panicked; degraded to neutral at the boundary
    InternalError,
}

impl NoTradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoTradeReason::MissingData => "missing_data",
            NoTradeReason::Expired => "expired",
            NoTradeReason::InformedFlow => "informed_flow",
            NoTradeReason::ThinBook => "thin_book",
            NoTradeReason::NoEdge => "no_edge",
            NoTradeReason::GateFailed => "gate_failed",
            NoTradeReason::InternalError => "internal_error",
        }
    }
}
