//! Heiken-Ashi candles.
//!
//! HA open is a recurrence over every earlier candle, so the whole series is
//! built as one left-to-right fold and cannot be windowed.

use crate::domain::Bar;
use crate::models::HeikenAshi;

/// Next HA candle given the previous one (`None` for the first bar).
pub fn next_heiken_ashi(prev: Option<&HeikenAshi>, bar: &Bar) -> HeikenAshi {
    let close = bar.ohlc4();
    let open = match prev {
        Some(p) => (p.open + p.close) / 2.0,
        None => (bar.open + bar.close) / 2.0,
    };
    HeikenAshi {
        open,
        high: open.max(close).max(bar.high),
        low: open.min(close).min(bar.low),
        close,
    }
}

/// HA candles for bars already in time order.
pub fn heiken_ashi(bars: &[Bar]) -> Vec<HeikenAshi> {
    bars.iter()
        .scan(None::<HeikenAshi>, |prev, bar| {
            let ha = next_heiken_ashi(prev.as_ref(), bar);
            *prev = Some(ha);
            Some(ha)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> Vec<Bar> {
        vec![
            Bar::new(0, 10.0, 12.0, 9.0, 11.0, 1.0),
            Bar::new(1, 11.0, 13.0, 10.5, 12.5, 1.0),
            Bar::new(2, 12.5, 12.8, 10.0, 10.2, 1.0),
            Bar::new(3, 10.2, 14.0, 10.1, 13.9, 1.0),
        ]
    }

    #[test]
    fn first_open_is_mean_of_own_open_and_close() {
        let ha = heiken_ashi(&bars());
        assert!((ha[0].open - 10.5).abs() < 1e-12);
        assert!((ha[0].close - 10.5).abs() < 1e-12);
    }

    #[test]
    fn open_follows_previous_ha_candle() {
        let input = bars();
        let ha = heiken_ashi(&input);
        for i in 1..ha.len() {
            let expected = (ha[i - 1].open + ha[i - 1].close) / 2.0;
            assert!((ha[i].open - expected).abs() < 1e-12);
            assert!((ha[i].close - input[i].ohlc4()).abs() < 1e-12);
        }
    }

    #[test]
    fn high_low_envelope_raw_extremes() {
        let input = bars();
        let ha = heiken_ashi(&input);
        for (candle, bar) in ha.iter().zip(&input) {
            assert!(candle.high >= candle.open && candle.high >= candle.close);
            assert!(candle.high >= bar.high);
            assert!(candle.low <= candle.open && candle.low <= candle.close);
            assert!(candle.low <= bar.low);
        }
    }

    #[test]
    fn empty_input() {
        assert!(heiken_ashi(&[]).is_empty());
    }
}
