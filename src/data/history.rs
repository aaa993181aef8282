//! Concurrent historical loads, in bounded batches.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::{task::JoinError, task::JoinHandle, time::Instant};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::data::source::MarketDataSource;
use crate::models::Series;

/// Time window and bar width for a historical load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub from_ms: i64,
    pub to_ms: i64,
    pub interval_ms: i64,
}

/// Load `window` for every symbol, at most `batch_size` requests in flight.
/// A symbol that fails (or returns nothing) is logged and skipped; the result
/// keeps the order of `symbols`.
pub async fn fetch_histories(
    source: Arc<dyn MarketDataSource>,
    symbols: &[String],
    window: HistoryWindow,
    batch_size: usize,
) -> Vec<Series> {
    let mut loaded = Vec::with_capacity(symbols.len());

    for batch in symbols.chunks(batch_size.max(1)) {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_fetch_progress {
            log::info!("--- Processing batch of size {} ---", batch.len());
        }
        let start_tasks_time = Instant::now();

        let handles: Vec<JoinHandle<Result<Series>>> = batch
            .iter()
            .map(|symbol| {
                let source = Arc::clone(&source);
                let symbol = symbol.clone();
                tokio::spawn(async move {
                    source
                        .get_bars(&symbol, window.from_ms, window.to_ms, window.interval_ms)
                        .await
                })
            })
            .collect();
        let results: Vec<Result<Result<Series>, JoinError>> = join_all(handles).await;

        for (symbol, result) in batch.iter().zip(results) {
            match result {
                Ok(Ok(series)) if series.is_empty() => {
                    log::warn!("{}: no bars in window, skipping", symbol);
                }
                Ok(Ok(series)) => loaded.push(series),
                Ok(Err(e)) => log::warn!("{}: history fetch failed: {:#}", symbol, e),
                Err(e) => log::error!("{}: history task failed: {:?}", symbol, e),
            }
        }

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_fetch_progress {
            log::info!("...batch completed in {:?}", start_tasks_time.elapsed());
        }
        #[cfg(not(debug_assertions))]
        let _ = start_tasks_time;
    }

    log::info!(
        "Loaded history for {}/{} symbols ({} via {})",
        loaded.len(),
        symbols.len(),
        crate::utils::TimeUtils::interval_to_string(window.interval_ms),
        source.signature()
    );
    loaded
}
