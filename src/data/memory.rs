//! In-memory `MarketDataSource`: fixed bars per symbol and interval plus a
//! scripted live stream. Backs the pipeline tests and offline replays.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::source::{MarketDataSource, StreamEvent};
use crate::domain::{Bar, SymbolInterval};
use crate::models::Series;

#[derive(Default)]
pub struct InMemorySource {
    bars: HashMap<(String, i64), Vec<Bar>>,
    failing: HashSet<String>,
    stream: Mutex<Option<mpsc::Receiver<StreamEvent>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, interval_ms: i64, bars: Vec<Bar>) -> Self {
        self.bars.insert((symbol.to_uppercase(), interval_ms), bars);
        self
    }

    /// Every `get_bars` call for `symbol` fails.
    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_uppercase());
        self
    }

    /// Receiver handed out by the first `subscribe` call.
    pub fn with_stream(self, rx: mpsc::Receiver<StreamEvent>) -> Self {
        if let Ok(mut slot) = self.stream.lock() {
            *slot = Some(rx);
        }
        self
    }
}

#[async_trait]
impl MarketDataSource for InMemorySource {
    fn signature(&self) -> &'static str {
        "In-memory"
    }

    async fn list_symbols(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .bars
            .keys()
            .map(|(symbol, _)| symbol.clone())
            .chain(self.failing.iter().cloned())
            .collect())
    }

    async fn get_bars(
        &self,
        symbol: &str,
        from_ms: i64,
        to_ms: i64,
        interval_ms: i64,
    ) -> Result<Series> {
        let symbol_interval = SymbolInterval::new(symbol, interval_ms);
        if self.failing.contains(symbol_interval.symbol()) {
            bail!("{} simulated fetch failure", symbol_interval);
        }
        let Some(bars) = self.bars.get(&(symbol_interval.symbol.clone(), interval_ms)) else {
            bail!("{} unknown symbol", symbol_interval);
        };
        let in_range = bars
            .iter()
            .filter(|b| b.open_time_ms >= from_ms && b.open_time_ms <= to_ms)
            .copied()
            .collect();
        Ok(Series::from_bars(symbol_interval, in_range))
    }

    fn subscribe(&self, _symbols: &[String], _interval_ms: i64) -> Result<mpsc::Receiver<StreamEvent>> {
        self.stream
            .lock()
            .map_err(|_| anyhow!("stream slot poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("in-memory stream already taken"))
    }
}
