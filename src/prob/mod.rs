//! Probability estimation: closed-form digital pricing, Monte Carlo
//! simulation, orderbook imbalance, and the multi-source blender.

pub mod blend;
pub mod closed_form;
pub mod orderbook;
pub mod simulator;

pub use blend::{blend_probabilities, BlendOutcome, BlendWeights};
pub use closed_form::{digital_p_up, ClosedFormResult};
pub use orderbook::{estimate_imbalance, OrderbookImbalance};
pub use simulator::{simulate_terminal, HistogramBin, SimulationParams, SimulationResult};
