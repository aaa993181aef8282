use serde::{Deserialize, Serialize};

/// One OHLCV sample for a fixed interval of one symbol.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Interval open time, epoch milliseconds
    pub open_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(open_time_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar {
            open_time_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Absolute size of the candle body.
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Mean of open, high, low and close.
    pub fn ohlc4(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_and_ohlc4() {
        let up = Bar::new(0, 10.0, 12.0, 9.0, 11.0, 100.0);
        assert!((up.body_size() - 1.0).abs() < 1e-12);
        assert!((up.ohlc4() - 10.5).abs() < 1e-12);

        let down = Bar::new(0, 11.0, 12.0, 9.0, 10.0, 100.0);
        assert!((down.body_size() - 1.0).abs() < 1e-12);
    }
}
