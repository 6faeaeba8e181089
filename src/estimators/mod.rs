//! Statistical estimators feeding the probability models.
//!
//! Leaf-first: log returns -> EWMA volatility and momentum drift ->
//! microstructure variance floor -> regime mixture weights.

pub mod ewma;
pub mod microstructure;
pub mod momentum;
pub mod regime;
pub mod returns;

pub use ewma::{estimate_ewma, EwmaState};
pub use microstructure::{total_volatility, MicrostructureResult};
pub use momentum::{estimate_drift, DriftEstimate};
pub use regime::{detect_regime, RegimeDetection, RegimeWeights};
pub use returns::log_returns;
