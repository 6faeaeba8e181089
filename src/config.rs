//! Engine configuration
//!
//! Every constant the signal pipeline depends on lives here so operators can
//! tune the engine without redeploying: estimation parameters, simulation
//! budget, blending thresholds, EV costs, Kelly caps, and the commitment
//! timing knobs. Values load from (in order) defaults, an optional TOML
//! file, then `UPDOWN_*` environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seconds in the annualization year (365 days). Matches the √525600
/// annualization used for 1-minute sampled volatility.
pub const SECS_PER_YEAR: f64 = 525_600.0 * 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Volatility Estimation ===
    /// EWMA decay for squared returns (RiskMetrics-style)
    pub ewma_lambda: f64,
    /// Returns required before the EWMA estimate is trusted
    pub min_calibration_samples: usize,
    /// Annualized vol substituted while uncalibrated
    pub default_annual_vol: f64,
    /// Samples per year for annualization (525600 = 1-minute bars)
    pub samples_per_year: f64,

    // === Momentum Drift ===
    /// Minimum |last return| for a continuation bias
    pub momentum_threshold: f64,
    /// Fraction of the last return carried as drift
    pub momentum_beta: f64,

    // === Microstructure Floor ===
    /// Irreducible noise floor added to total variance (eta)
    pub micro_eta: f64,

    // === Regime Classification ===
    /// Lookback for the recent-vs-prior vol ratio (seconds)
    pub recent_vol_lookback_secs: i64,
    /// Annualized vol below this is the low-vol regime
    pub low_vol_threshold: f64,
    /// Annualized vol above this is the high-vol regime
    pub high_vol_threshold: f64,
    /// Recent/prior vol ratio above this is event-driven
    pub event_ratio_threshold: f64,

    // === Monte Carlo Simulation ===
    /// Terminal-price paths per recompute
    pub num_paths: usize,
    /// Soft wall-clock budget; exceeding it falls back to closed form
    pub sim_budget_ms: f64,
    /// Build the diagnostic terminal-price histogram
    pub collect_histogram: bool,
    /// Histogram bin count
    pub histogram_bins: usize,
    /// Vol convexity bump as the window runs down
    pub vol_convexity: f64,
    /// Per-regime vol multipliers: low / high / event
    pub regime_vol_multipliers: [f64; 3],

    // === Orderbook / Blending ===
    /// Depth at which the depth score saturates
    pub reference_depth: f64,
    /// Spread at or below this counts as tight
    pub tight_spread: f64,
    /// Total depth at or above this counts as deep
    pub deep_book_depth: f64,
    /// Market/sim disagreement that starts shifting blend weight
    pub disagreement_shift_threshold: f64,
    /// Maximum weight moved from market to sim
    pub max_weight_shift: f64,

    // === EV Gate & Kelly ===
    /// Round-trip transaction cost in probability units
    pub transaction_cost: f64,
    /// Model error margin added to the gate
    pub error_margin: f64,
    /// Fractional Kelly multiplier (0.25 = quarter Kelly)
    pub kelly_cap: f64,
    /// Payout-odds ratio beyond which the haircut applies
    pub rr_haircut_threshold: f64,
    /// Multiplier applied when risk:reward is extreme
    pub rr_haircut: f64,
    /// Absolute ceiling on bankroll fraction per trade
    pub max_position_pct: f64,
    /// Bankroll for dollar sizing
    pub bankroll: f64,

    // === Commitment State Machine ===
    /// Edge below this yields Wait instead of TradeNow
    pub min_edge: f64,
    /// Total book depth below this is untradeable
    pub min_depth: f64,
    /// Disagreement that triggers the informed-flow invalidation
    pub informed_flow_disagreement: f64,
    /// Depth above which disagreement is treated as informed flow
    pub informed_flow_depth: f64,
    /// EV that commits immediately without waiting for better
    pub early_commit_ev: f64,
    /// Commit the best plan once expiry is this close (seconds)
    pub forced_commit_horizon_secs: f64,
    /// Quiescence interval before a debounced recompute fires
    pub debounce_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Volatility
            ewma_lambda: 0.94,
            min_calibration_samples: 10,
            default_annual_vol: 0.60, // 60% annualized until calibrated
            samples_per_year: 525_600.0,

            // Momentum
            momentum_threshold: 0.0015,
            momentum_beta: 0.5,

            // Microstructure
            micro_eta: 0.00075, // mid of the [0.0005, 0.001] band

            // Regime
            recent_vol_lookback_secs: 120,
            low_vol_threshold: 0.40,
            high_vol_threshold: 0.80,
            event_ratio_threshold: 2.0,

            // Simulation
            num_paths: 100_000,
            sim_budget_ms: 125.0,
            collect_histogram: false,
            histogram_bins: 50,
            vol_convexity: 0.3,
            regime_vol_multipliers: [0.7, 1.3, 1.8],

            // Orderbook / blending
            reference_depth: 100.0,
            tight_spread: 0.02,
            deep_book_depth: 500.0,
            disagreement_shift_threshold: 0.10,
            max_weight_shift: 0.15,

            // EV / Kelly - conservative for real money
            transaction_cost: 0.01,
            error_margin: 0.02,
            kelly_cap: 0.25,        // Quarter Kelly
            rr_haircut_threshold: 5.0,
            rr_haircut: 0.5,
            max_position_pct: 0.25, // Hard ceiling per trade
            bankroll: 10_000.0,

            // Commitment
            min_edge: 0.02,
            min_depth: 20.0, // contracts
            informed_flow_disagreement: 0.15,
            informed_flow_depth: 200.0,
            early_commit_ev: 0.08,
            forced_commit_horizon_secs: 180.0,
            debounce_ms: 500,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let cfg: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply validated `UPDOWN_*` environment overrides on top of `self`.
    pub fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("UPDOWN_MIN_EDGE") {
            if let Ok(val) = v.parse::<f64>() {
                if val > 0.0 && val < 0.5 {
                    self.min_edge = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_KELLY_CAP") {
            if let Ok(val) = v.parse::<f64>() {
                if val > 0.0 && val <= 1.0 {
                    self.kelly_cap = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_MAX_POSITION_PCT") {
            if let Ok(val) = v.parse::<f64>() {
                if val > 0.0 && val <= 1.0 {
                    self.max_position_pct = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_BANKROLL") {
            if let Ok(val) = v.parse::<f64>() {
                if val > 0.0 {
                    self.bankroll = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_NUM_PATHS") {
            if let Ok(val) = v.parse::<usize>() {
                if val >= 100 {
                    self.num_paths = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_SIM_BUDGET_MS") {
            if let Ok(val) = v.parse::<f64>() {
                if val > 0.0 {
                    self.sim_budget_ms = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_DEBOUNCE_MS") {
            if let Ok(val) = v.parse::<i64>() {
                if val >= 0 {
                    self.debounce_ms = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_FORCED_COMMIT_SECS") {
            if let Ok(val) = v.parse::<f64>() {
                if val > 0.0 {
                    self.forced_commit_horizon_secs = val;
                }
            }
        }
        if let Ok(v) = std::env::var("UPDOWN_MICRO_ETA") {
            if let Ok(val) = v.parse::<f64>() {
                if (0.0005..=0.001).contains(&val) {
                    self.micro_eta = val;
                }
            }
        }
        self
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.ewma_lambda > 0.0 && self.ewma_lambda < 1.0,
            "ewma_lambda must be in (0, 1), got {}",
            self.ewma_lambda
        );
        anyhow::ensure!(
            self.micro_eta > 0.0,
            "micro_eta must be positive, got {}",
            self.micro_eta
        );
        anyhow::ensure!(
            self.low_vol_threshold < self.high_vol_threshold,
            "low_vol_threshold {} must be below high_vol_threshold {}",
            self.low_vol_threshold,
            self.high_vol_threshold
        );
        anyhow::ensure!(self.num_paths > 0, "num_paths must be positive");
        anyhow::ensure!(self.histogram_bins > 0, "histogram_bins must be positive");
        anyhow::ensure!(
            self.kelly_cap > 0.0 && self.kelly_cap <= 1.0,
            "kelly_cap must be in (0, 1], got {}",
            self.kelly_cap
        );
        anyhow::ensure!(
            self.max_position_pct > 0.0 && self.max_position_pct <= 1.0,
            "max_position_pct must be in (0, 1], got {}",
            self.max_position_pct
        );
        anyhow::ensure!(self.bankroll > 0.0, "bankroll must be positive");
        anyhow::ensure!(self.debounce_ms >= 0, "debounce_ms must be non-negative");
        anyhow::ensure!(
            self.forced_commit_horizon_secs > 0.0,
            "forced_commit_horizon_secs must be positive"
        );
        Ok(())
    }
}
