use serde::{Deserialize, Serialize};

use super::heiken_ashi::heiken_ashi;
use super::rsi::rsi;
use crate::models::{IndicatorRow, Series};
use crate::utils::maths_utils::percent_change;

/// Window sizes for the derived columns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub rsi_period: usize,
}

/// Trailing simple moving average. `None` until `window` values are available.
pub fn sma(window: usize, values: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = Some(sum / window as f64);
    }
    out
}

/// One `IndicatorRow` per bar of `series`, in the same order.
pub fn compute_indicator_rows(series: &Series, params: &IndicatorParams) -> Vec<IndicatorRow> {
    let bars = series.bars();
    let closes = series.closes();

    let fast = sma(params.fast_window, &closes);
    let slow = sma(params.slow_window, &closes);
    let rsi_values = rsi(params.rsi_period, &closes);
    let ha = heiken_ashi(bars);

    (0..bars.len())
        .map(|i| {
            let bar = bars[i];
            let prev = i.checked_sub(1).map(|p| bars[p]);
            let prev_close = prev.map(|p| p.close);
            let prev_volume = prev.map(|p| p.volume);

            IndicatorRow {
                bar,
                fast_sma: fast[i],
                slow_sma: slow[i],
                prev_fast_sma: i.checked_sub(1).and_then(|p| fast[p]),
                prev_slow_sma: i.checked_sub(1).and_then(|p| slow[p]),
                prev_close,
                price_change: prev_close.map(|pc| bar.close - pc),
                percent_change: prev_close.and_then(|pc| percent_change(pc, bar.close)),
                prev_volume,
                volume_change: prev_volume.map(|pv| bar.volume - pv),
                volume_percent_change: prev_volume.and_then(|pv| percent_change(pv, bar.volume)),
                bar_size: bar.body_size(),
                rsi: rsi_values[i],
                heiken_ashi: ha[i],
            }
        })
        .collect()
}
