//! Return series builder.
//!
//! Converts an ordered tick sequence into log returns. Non-positive prices
//! and non-finite ratios are dropped, not inserted as zero, so downstream
//! variance estimates never see poisoned samples.

use crate::models::PriceTick;

/// Log returns r_i = ln(close_i / close_{i-1}) for consecutive valid ticks.
pub fn log_returns(ticks: &[PriceTick]) -> Vec<f64> {
    let mut out = Vec::with_capacity(ticks.len().saturating_sub(1));
    for pair in ticks.windows(2) {
        let (prev, cur) = (pair[0].close, pair[1].close);
        if prev <= 0.0 || cur <= 0.0 {
            continue;
        }
        let r = (cur / prev).ln();
        if r.is_finite() {
            out.push(r);
        }
    }
    out
}
