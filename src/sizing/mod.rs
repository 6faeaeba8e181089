//! Expected-value gating and Kelly position sizing.

pub mod ev;
pub mod kelly;

pub use ev::{evaluate_ev, EvDecision};
pub use kelly::{kelly_size, KellyResult};
