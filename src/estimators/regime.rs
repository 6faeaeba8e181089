//! Regime classification.
//!
//! Blends three volatility regimes (low / high / event-driven) into mixture
//! weights from the annualized EWMA vol and the ratio of recent-window vol
//! to prior vol. The weights drive per-regime path allocation in the
//! Monte Carlo simulator.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::estimators::ewma::EwmaState;
use crate::models::{MarketRegime, PriceTick};

/// Mixture weights over {low-vol, high-vol, event-driven}, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeWeights {
    pub low: f64,
    pub high: f64,
    pub event: f64,
}

impl RegimeWeights {
    pub const LOW: RegimeWeights = RegimeWeights { low: 0.7, high: 0.2, event: 0.1 };
    pub const HIGH: RegimeWeights = RegimeWeights { low: 0.1, high: 0.7, event: 0.2 };
    pub const EVENT: RegimeWeights = RegimeWeights { low: 0.1, high: 0.2, event: 0.7 };
    /// Used when history is too short to classify at all.
    pub const SPARSE_DEFAULT: RegimeWeights = RegimeWeights { low: 0.8, high: 0.15, event: 0.05 };

    pub fn sum(&self) -> f64 {
        self.low + self.high + self.event
    }

    pub fn normalized(self) -> Self {
        let s = self.sum();
        if s <= 0.0 {
            return Self::SPARSE_DEFAULT;
        }
        Self {
            low: self.low / s,
            high: self.high / s,
            event: self.event / s,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.low, self.high, self.event]
    }
}

/// Classification output consumed by the simulator and the trade plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegimeDetection {
    pub regime: MarketRegime,
    pub weights: RegimeWeights,
    pub annualized_vol: f64,
    /// sqrt(recent-window variance / prior variance); 1 when undetermined
    pub recent_vol_ratio: f64,
}

/// Classify the current regime from the tick history and EWMA state.
///
/// Returns whose source tick falls inside `recent_vol_lookback_secs` of the
/// newest tick form the recent window; everything earlier is the prior.
pub fn detect_regime(
    ticks: &[PriceTick],
    returns: &[f64],
    ewma: &EwmaState,
    cfg: &EngineConfig,
) -> RegimeDetection {
    let annualized_vol = ewma.effective_annual_vol(cfg);

    if ticks.len() < 5 {
        return RegimeDetection {
            regime: MarketRegime::LowVol,
            weights: RegimeWeights::SPARSE_DEFAULT,
            annualized_vol,
            recent_vol_ratio: 1.0,
        };
    }

    let recent_vol_ratio = recent_vol_ratio(ticks, returns, cfg);

    let (regime, weights) = if recent_vol_ratio > cfg.event_ratio_threshold {
        (MarketRegime::EventDriven, RegimeWeights::EVENT)
    } else if annualized_vol > cfg.high_vol_threshold {
        (MarketRegime::HighVol, RegimeWeights::HIGH)
    } else if annualized_vol < cfg.low_vol_threshold {
        (MarketRegime::LowVol, RegimeWeights::LOW)
    } else {
        // Linear blend between the low and high vectors by position inside
        // the [low, high] threshold band.
        let t = (annualized_vol - cfg.low_vol_threshold)
            / (cfg.high_vol_threshold - cfg.low_vol_threshold);
        let lo = RegimeWeights::LOW;
        let hi = RegimeWeights::HIGH;
        let blended = RegimeWeights {
            low: (1.0 - t) * lo.low + t * hi.low,
            high: (1.0 - t) * lo.high + t * hi.high,
            event: (1.0 - t) * lo.event + t * hi.event,
        }
        .normalized();
        let label = if t < 0.5 {
            MarketRegime::LowVol
        } else {
            MarketRegime::HighVol
        };
        (label, blended)
    };

    RegimeDetection {
        regime,
        weights,
        annualized_vol,
        recent_vol_ratio,
    }
}

/// sqrt(recent variance / prior variance) with the recent window anchored at
/// the newest tick. Falls back to 1.0 when either side is empty or flat.
fn recent_vol_ratio(ticks: &[PriceTick], returns: &[f64], cfg: &EngineConfig) -> f64 {
    if returns.is_empty() || ticks.len() < 2 {
        return 1.0;
    }
    let cutoff_ms = ticks[ticks.len() - 1].ts_ms - cfg.recent_vol_lookback_secs * 1000;

    // Return i is realized at ticks[i + 1]. The tick/return alignment only
    // holds when no samples were dropped; with drops this is approximate,
    // which is acceptable for a ratio test.
    let n = returns.len().min(ticks.len() - 1);
    let mut recent = Vec::new();
    let mut prior = Vec::new();
    for i in 0..n {
        let ts = ticks[ticks.len() - n + i].ts_ms;
        if ts >= cutoff_ms {
            recent.push(returns[returns.len() - n + i]);
        } else {
            prior.push(returns[returns.len() - n + i]);
        }
    }

    let recent_var = mean_square(&recent);
    let prior_var = mean_square(&prior);
    if recent_var <= 0.0 || prior_var <= 0.0 {
        return 1.0;
    }
    (recent_var / prior_var).sqrt()
}

fn mean_square(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().map(|x| x * x).sum::<f64>() / xs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::{estimate_ewma, log_returns};

    fn ticks_from_closes(closes: &[f64], step_ms: i64) -> Vec<PriceTick> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceTick {
                ts_ms: i as i64 * step_ms,
                close,
            })
            .collect()
    }

    fn detect(closes: &[f64], step_ms: i64, cfg: &EngineConfig) -> RegimeDetection {
        let ticks = ticks_from_closes(closes, step_ms);
        let returns = log_returns(&ticks);
        let ewma = estimate_ewma(&returns, cfg);
        detect_regime(&ticks, &returns, &ewma, cfg)
    }

    #[test]
    fn test_sparse_history_defaults_low() {
        let cfg = EngineConfig::default();
        let d = detect(&[100.0, 100.1, 100.0], 60_000, &cfg);
        assert_eq!(d.regime, MarketRegime::LowVol);
        assert_eq!(d.weights, RegimeWeights::SPARSE_DEFAULT);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let cfg = EngineConfig::default();
        for w in [
            RegimeWeights::LOW,
            RegimeWeights::HIGH,
            RegimeWeights::EVENT,
            RegimeWeights::SPARSE_DEFAULT,
        ] {
            assert!(
                (w.sum() - 1.0).abs() < 1e-9,
                "weights {:?} sum to {}",
                w,
                w.sum()
            );
        }
        // The mid-band blend must also renormalize to 1
        // ~8.3bp alternating per minute lands near 60% annualized, inside
        // the [0.40, 0.80] blend band.
        let closes: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.083 })
            .collect();
        let d = detect(&closes, 60_000, &cfg);
        assert!(
            d.annualized_vol > cfg.low_vol_threshold && d.annualized_vol < cfg.high_vol_threshold,
            "vol {} should be in the blend band",
            d.annualized_vol
        );
        assert!((d.weights.sum() - 1.0).abs() < 1e-9);
        assert_ne!(d.weights, RegimeWeights::LOW);
        assert_ne!(d.weights, RegimeWeights::HIGH);
    }

    #[test]
    fn test_quiet_tape_is_low_vol() {
        let cfg = EngineConfig::default();
        // ~2bp alternating moves per minute: well under 40% annualized
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 0.02 * ((i % 2) as f64))
            .collect();
        let d = detect(&closes, 60_000, &cfg);
        assert_eq!(d.regime, MarketRegime::LowVol);
        assert_eq!(d.weights, RegimeWeights::LOW);
    }

    #[test]
    fn test_wild_tape_is_high_vol() {
        let cfg = EngineConfig::default();
        // 50bp alternating per minute is far above 80% annualized
        let closes: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.5 })
            .collect();
        let d = detect(&closes, 60_000, &cfg);
        assert!(d.annualized_vol > cfg.high_vol_threshold);
        assert_eq!(d.regime, MarketRegime::HighVol);
    }

    #[test]
    fn test_recent_burst_is_event_driven() {
        let cfg = EngineConfig::default();
        // Calm for 28 minutes, violent for the last 2
        let mut closes: Vec<f64> = (0..28).map(|i| 100.0 + 0.005 * ((i % 2) as f64)).collect();
        for i in 0..3 {
            closes.push(if i % 2 == 0 { 101.5 } else { 99.0 });
        }
        let d = detect(&closes, 60_000, &cfg);
        assert!(
            d.recent_vol_ratio > cfg.event_ratio_threshold,
            "ratio {} should exceed {}",
            d.recent_vol_ratio,
            cfg.event_ratio_threshold
        );
        assert_eq!(d.regime, MarketRegime::EventDriven);
        assert_eq!(d.weights, RegimeWeights::EVENT);
    }

    #[test]
    fn test_ratio_defaults_to_one_on_flat_prior() {
        let cfg = EngineConfig::default();
        let closes = vec![100.0; 30];
        let d = detect(&closes, 60_000, &cfg);
        assert!((d.recent_vol_ratio - 1.0).abs() < 1e-12);
    }
}
