use serde::{Deserialize, Serialize};

use crate::utils::TimeUtils;

/// A symbol sampled at one bar interval. Keys every Series and every fetch.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SymbolInterval {
    pub symbol: String,
    pub interval_ms: i64,
}

impl SymbolInterval {
    pub fn new(symbol: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            interval_ms,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval_label(&self) -> &'static str {
        TimeUtils::interval_to_string(self.interval_ms)
    }
}

impl std::fmt::Display for SymbolInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.symbol, self.interval_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_and_displays() {
        let si = SymbolInterval::new("btcusdt", TimeUtils::MS_IN_H);
        assert_eq!(si.symbol(), "BTCUSDT");
        assert_eq!(si.to_string(), "BTCUSDT (1h)");
    }
}
