use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which evaluator produced a signal
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Crossover,
    Breakout,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Direction {
    Up,
    Down,
}

/// RSI band a signal falls into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Display)]
pub enum RsiTag {
    #[strum(serialize = "*OVERSOLD*")]
    Oversold,
    #[strum(serialize = "*OVERBOUGHT*")]
    Overbought,
    #[default]
    #[strum(serialize = "")]
    Neutral,
}

impl RsiTag {
    pub const OVERSOLD_BELOW: f64 = 30.0;
    pub const OVERBOUGHT_ABOVE: f64 = 70.0;

    pub fn from_rsi(rsi: Option<f64>) -> Self {
        match rsi {
            Some(v) if v < Self::OVERSOLD_BELOW => RsiTag::Oversold,
            Some(v) if v > Self::OVERBOUGHT_ABOVE => RsiTag::Overbought,
            _ => RsiTag::Neutral,
        }
    }
}

/// Metrics that triggered a signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub price_change: f64,
    pub percent_change: Option<f64>,
    pub volume: f64,
    pub rsi: Option<f64>,
}

/// One match produced by an evaluation pass. Transient: rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub direction: Direction,
    /// Open time of the bar that triggered the signal
    pub open_time_ms: i64,
    pub metrics: SignalMetrics,
}

impl Signal {
    pub fn rsi_tag(&self) -> RsiTag {
        RsiTag::from_rsi(self.metrics.rsi)
    }

    pub fn description(&self) -> String {
        format!(
            "{} {} {} (change {:.2})",
            self.symbol, self.strategy, self.direction, self.metrics.price_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rsi_tag_bands() {
        assert_eq!(RsiTag::from_rsi(Some(12.0)), RsiTag::Oversold);
        assert_eq!(RsiTag::from_rsi(Some(30.0)), RsiTag::Neutral);
        assert_eq!(RsiTag::from_rsi(Some(70.0)), RsiTag::Neutral);
        assert_eq!(RsiTag::from_rsi(Some(85.0)), RsiTag::Overbought);
        assert_eq!(RsiTag::from_rsi(None), RsiTag::Neutral);
        assert_eq!(RsiTag::Oversold.to_string(), "*OVERSOLD*");
        assert_eq!(RsiTag::Neutral.to_string(), "");
    }

    #[test]
    fn strategy_names() {
        assert_eq!(StrategyKind::Crossover.to_string(), "crossover");
        assert_eq!(StrategyKind::from_str("breakout").unwrap(), StrategyKind::Breakout);
        assert_eq!(Direction::Down.to_string(), "Down");
    }
}
