use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::Bar;
use crate::models::Series;

/// A closed bar pushed by a live subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct BarUpdate {
    pub symbol: String,
    pub bar: Bar,
}

/// Everything a live subscription can report.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// (Re)connected. Bars may have been missed since the previous connection.
    Connected,
    Bar(BarUpdate),
    Disconnected(String),
}

/// A market-data provider: symbol discovery, historical bars, live bars.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// A unique identifier for this implementation (so that afterwards we know which one we used).
    fn signature(&self) -> &'static str;

    /// Candidate symbols, upper case.
    async fn list_symbols(&self) -> Result<BTreeSet<String>>;

    /// Bars with open time in `[from_ms, to_ms]`, ordered.
    async fn get_bars(&self, symbol: &str, from_ms: i64, to_ms: i64, interval_ms: i64)
    -> Result<Series>;

    /// Start streaming closed bars for `symbols`. The subscription reconnects on
    /// its own and stops once the receiver is dropped.
    fn subscribe(&self, symbols: &[String], interval_ms: i64) -> Result<mpsc::Receiver<StreamEvent>>;
}
