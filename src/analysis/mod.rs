// Indicator engine and signal evaluation
pub mod evaluator;
pub mod heiken_ashi;
pub mod indicators;
pub mod rsi;

// Re-export commonly used types
pub use evaluator::{BreakoutParams, CrossoverParams, Evaluation, Strategy};
pub use indicators::{IndicatorParams, compute_indicator_rows};
