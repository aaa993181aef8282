// Domain models for bar scanning
// These modules contain pure data types independent of any data source

pub mod indicator_row;
pub mod series;
pub mod signal;

// Re-export key types for convenience
pub use indicator_row::{HeikenAshi, IndicatorRow};
pub use series::{PushOutcome, Series};
pub use signal::{Direction, RsiTag, Signal, SignalMetrics, StrategyKind};
