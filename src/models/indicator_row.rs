use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Heiken-Ashi candle derived from a raw bar and the previous HA candle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct HeikenAshi {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A bar plus every derived column. `None` means "not enough history yet"
/// (or an undefined ratio), never zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,

    // Moving averages
    pub fast_sma: Option<f64>,
    pub slow_sma: Option<f64>,
    pub prev_fast_sma: Option<f64>,
    pub prev_slow_sma: Option<f64>,

    // Price deltas against the previous bar
    pub prev_close: Option<f64>,
    pub price_change: Option<f64>,
    pub percent_change: Option<f64>,

    // Volume deltas against the previous bar
    pub prev_volume: Option<f64>,
    pub volume_change: Option<f64>,
    pub volume_percent_change: Option<f64>,

    /// |close - open|
    pub bar_size: f64,
    pub rsi: Option<f64>,
    pub heiken_ashi: HeikenAshi,
}

impl IndicatorRow {
    pub fn open_time_ms(&self) -> i64 {
        self.bar.open_time_ms
    }

    /// fast - slow, when both averages exist
    pub fn sma_spread(&self) -> Option<f64> {
        Some(self.fast_sma? - self.slow_sma?)
    }

    /// prev fast - prev slow, when both averages exist
    pub fn prev_sma_spread(&self) -> Option<f64> {
        Some(self.prev_fast_sma? - self.prev_slow_sma?)
    }
}
