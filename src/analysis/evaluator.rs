//! Signal evaluation shared by every scanner.
//!
//! A `Strategy` is just a parameter set: the crossover and breakout scanners
//! run the same indicator engine and only differ in the rule applied to the
//! newest rows.

use serde::{Deserialize, Serialize};

use super::indicators::{IndicatorParams, compute_indicator_rows};
use crate::models::{Direction, IndicatorRow, Series, Signal, SignalMetrics, StrategyKind};
use crate::utils::maths_utils::{get_max, mean, mean_defined};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CrossoverParams {
    pub indicators: IndicatorParams,
    /// Signals whose |price change| on the crossing bar is not above this are dropped
    pub min_price_change: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub indicators: IndicatorParams,
    /// Oldest bars of the inspected window, the baseline
    pub trend_bars: usize,
    /// Newest bars of the inspected window, tested against the baseline
    pub eval_bars: usize,
    pub min_bar_volume: f64,
    /// Minimum average percent close change over the evaluation bars
    pub min_avg_percent_change: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Strategy {
    Crossover(CrossoverParams),
    Breakout(BreakoutParams),
}

/// Rows plus the decision for one symbol.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub rows: Vec<IndicatorRow>,
    pub signal: Option<Signal>,
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Crossover(_) => StrategyKind::Crossover,
            Strategy::Breakout(_) => StrategyKind::Breakout,
        }
    }

    pub fn indicator_params(&self) -> &IndicatorParams {
        match self {
            Strategy::Crossover(p) => &p.indicators,
            Strategy::Breakout(p) => &p.indicators,
        }
    }

    /// Fewest bars for which the rule can possibly fire.
    pub fn min_bars(&self) -> usize {
        match self {
            // Needs the slow average on both the latest and the previous row
            Strategy::Crossover(p) => p.indicators.slow_window.max(p.indicators.fast_window) + 1,
            Strategy::Breakout(p) => p.trend_bars + p.eval_bars,
        }
    }

    /// Decide on the newest row(s). Older rows only feed the windows.
    pub fn evaluate(&self, symbol: &str, rows: &[IndicatorRow]) -> Option<Signal> {
        match self {
            Strategy::Crossover(p) => evaluate_crossover(symbol, rows, p),
            Strategy::Breakout(p) => evaluate_breakout(symbol, rows, p),
        }
    }

    pub fn evaluate_series(&self, series: &Series) -> Evaluation {
        let rows = compute_indicator_rows(series, self.indicator_params());
        let signal = self.evaluate(series.symbol(), &rows);
        Evaluation { rows, signal }
    }
}

// ============================================================================
// Crossover
// ============================================================================

/// Direction of a strict sign flip of (fast - slow) between two rows.
/// Zero on either side is not a flip.
pub fn crossover_direction(prev_spread: f64, spread: f64) -> Option<Direction> {
    if spread > 0.0 && prev_spread < 0.0 {
        Some(Direction::Up)
    } else if spread < 0.0 && prev_spread > 0.0 {
        Some(Direction::Down)
    } else {
        None
    }
}

pub fn evaluate_crossover(
    symbol: &str,
    rows: &[IndicatorRow],
    params: &CrossoverParams,
) -> Option<Signal> {
    let latest = rows.last()?;
    let direction = crossover_direction(latest.prev_sma_spread()?, latest.sma_spread()?)?;

    let price_change = latest.price_change?;
    if price_change.abs() <= params.min_price_change {
        return None;
    }

    Some(Signal {
        symbol: symbol.to_string(),
        strategy: StrategyKind::Crossover,
        direction,
        open_time_ms: latest.open_time_ms(),
        metrics: SignalMetrics {
            price_change,
            percent_change: latest.percent_change,
            volume: latest.bar.volume,
            rsi: latest.rsi,
        },
    })
}

// ============================================================================
// Breakout (volume / price)
// ============================================================================

/// Aggregates over the trend and evaluation windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutStats {
    pub trend_max_close: f64,
    pub eval_avg_close: f64,
    pub eval_avg_volume: f64,
    /// `None` when no evaluation bar has a defined percent change
    pub eval_avg_percent_change: Option<f64>,
}

impl BreakoutStats {
    pub fn fires(&self, params: &BreakoutParams) -> bool {
        let Some(avg_pct) = self.eval_avg_percent_change else {
            return false;
        };
        self.eval_avg_close > self.trend_max_close
            && self.eval_avg_volume > params.min_bar_volume
            && avg_pct > params.min_avg_percent_change
    }
}

/// Stats over the newest `trend_bars + eval_bars` rows, `None` if there are fewer.
pub fn breakout_stats(rows: &[IndicatorRow], params: &BreakoutParams) -> Option<BreakoutStats> {
    let window_len = params.trend_bars + params.eval_bars;
    if params.trend_bars == 0 || params.eval_bars == 0 || rows.len() < window_len {
        return None;
    }
    let window = &rows[rows.len() - window_len..];
    let (trend, eval) = window.split_at(params.trend_bars);

    let closes = |rs: &[IndicatorRow]| rs.iter().map(|r| r.bar.close).collect::<Vec<f64>>();
    let eval_volumes: Vec<f64> = eval.iter().map(|r| r.bar.volume).collect();

    Some(BreakoutStats {
        trend_max_close: get_max(&closes(trend))?,
        eval_avg_close: mean(&closes(eval))?,
        eval_avg_volume: mean(&eval_volumes)?,
        eval_avg_percent_change: mean_defined(eval.iter().map(|r| r.percent_change)),
    })
}

pub fn evaluate_breakout(
    symbol: &str,
    rows: &[IndicatorRow],
    params: &BreakoutParams,
) -> Option<Signal> {
    let stats = breakout_stats(rows, params)?;
    if !stats.fires(params) {
        return None;
    }
    let latest = rows.last()?;

    Some(Signal {
        symbol: symbol.to_string(),
        strategy: StrategyKind::Breakout,
        direction: Direction::Up,
        open_time_ms: latest.open_time_ms(),
        metrics: SignalMetrics {
            price_change: latest.price_change.unwrap_or_default(),
            percent_change: stats.eval_avg_percent_change,
            volume: stats.eval_avg_volume,
            rsi: latest.rsi,
        },
    })
}
