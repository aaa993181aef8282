//! Binance spot adapter: REST klines for history, the combined kline stream for live bars.

pub mod kline;
pub mod stream;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use itertools::Itertools;
use tokio::sync::mpsc;

use crate::config::BINANCE;
use crate::data::source::{MarketDataSource, StreamEvent};
use crate::domain::SymbolInterval;
use crate::models::Series;

pub use kline::KlineError;

pub struct BinanceSource {
    /// Candidate list, one symbol per line
    symbols_file: PathBuf,
    /// Used to size the rate-limit headroom of each kline call
    simultaneous_calls: u32,
    channel_capacity: usize,
}

impl BinanceSource {
    pub fn new(symbols_file: impl Into<PathBuf>, channel_capacity: usize) -> Self {
        Self {
            symbols_file: symbols_file.into(),
            simultaneous_calls: BINANCE.limits.simultaneous_calls_ceiling as u32,
            channel_capacity,
        }
    }
}

/// Upper-cased, trimmed, non-empty lines, in file order and without repeats.
pub fn parse_symbols_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .unique()
        .collect()
}

#[async_trait]
impl MarketDataSource for BinanceSource {
    fn signature(&self) -> &'static str {
        "Binance API"
    }

    async fn list_symbols(&self) -> Result<BTreeSet<String>> {
        let content = tokio::fs::read_to_string(&self.symbols_file)
            .await
            .with_context(|| format!("Failed to read symbols file {}", self.symbols_file.display()))?;
        Ok(parse_symbols_file(&content).into_iter().collect())
    }

    async fn get_bars(
        &self,
        symbol: &str,
        from_ms: i64,
        to_ms: i64,
        interval_ms: i64,
    ) -> Result<Series> {
        let symbol_interval = SymbolInterval::new(symbol, interval_ms);
        let bars = kline::load_bars(
            symbol_interval.symbol(),
            interval_ms,
            from_ms,
            to_ms,
            self.simultaneous_calls,
        )
        .await
        .with_context(|| format!("{} kline load failed", symbol_interval))?;
        Ok(Series::from_bars(symbol_interval, bars))
    }

    fn subscribe(&self, symbols: &[String], interval_ms: i64) -> Result<mpsc::Receiver<StreamEvent>> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        // One connection per chunk of streams, all feeding the same channel
        for chunk in symbols.chunks(BINANCE.ws.max_streams_per_connection) {
            let url = stream::build_combined_stream_url(chunk, interval_ms)?;
            log::info!(
                ">>> KlineStream: subscribing to {} symbols at {}",
                chunk.len(),
                crate::utils::TimeUtils::interval_to_string(interval_ms)
            );
            tokio::spawn(stream::run_kline_stream_with_reconnect(url, tx.clone()));
        }
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_file_is_normalised() {
        let content = "btcusdt\n  ETHUSDT  \n\n# comment\nBTCUSDT\nsolusdt\n";
        assert_eq!(parse_symbols_file(content), vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
    }
}
