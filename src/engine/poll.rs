//! Poll mode: refetch every symbol's history window, evaluate, report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rayon::prelude::*;

use super::schedule::ScanSchedule;
use crate::analysis::Strategy;
use crate::config::settings::ScanSettings;
use crate::config::BINANCE;
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::data::{HistoryWindow, MarketDataSource, fetch_histories};
use crate::models::{Series, Signal};
use crate::notify::{Notifier, deliver_pages};
use crate::report::render_report;
use crate::utils::time_utils::{floor_to_interval, now_timestamp_ms};

/// What one scan cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub symbols_scanned: usize,
    pub signals: Vec<Signal>,
    pub pages: usize,
    pub pages_delivered: usize,
}

/// Evaluate every series in parallel. Signals keep the order of `series`.
pub fn scan_series(strategy: &Strategy, series: &[Series]) -> Vec<Signal> {
    series
        .par_iter()
        .filter_map(|s| strategy.evaluate_series(s).signal)
        .collect()
}

/// The completed bars of the `lookback` window before the interval containing `now_ms`.
pub fn scan_window(settings: &ScanSettings, now_ms: i64) -> HistoryWindow {
    let current_open = floor_to_interval(now_ms, settings.interval_ms);
    HistoryWindow {
        from_ms: current_open - settings.lookback_ms,
        to_ms: current_open - 1,
        interval_ms: settings.interval_ms,
    }
}

pub async fn run_scan_cycle(
    source: Arc<dyn MarketDataSource>,
    notifier: &dyn Notifier,
    settings: &ScanSettings,
    symbols: &[String],
    now_ms: i64,
) -> ScanOutcome {
    let window = scan_window(settings, now_ms);
    let mut histories = fetch_histories(
        source,
        symbols,
        window,
        BINANCE.limits.simultaneous_calls_ceiling,
    )
    .await;

    if let Some(session) = &settings.session {
        for series in histories.iter_mut() {
            series.retain_session(session);
        }
    }

    let signals = scan_series(&settings.strategy, &histories);
    let pages = render_report(
        &settings.report.title,
        &signals,
        settings.report.max_rows_per_message,
    );

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_report_pages {
        for page in &pages {
            log::info!("\n{}", page);
        }
    }

    let channel_id = settings.discord.channel_id.as_deref().unwrap_or_default();
    let pages_delivered = deliver_pages(notifier, channel_id, &pages).await;

    log::info!(
        "Scan of {} symbols: {} {} signals, {}/{} pages delivered",
        histories.len(),
        signals.len(),
        settings.kind(),
        pages_delivered,
        pages.len()
    );

    ScanOutcome {
        symbols_scanned: histories.len(),
        signals,
        pages: pages.len(),
        pages_delivered,
    }
}

/// Scan whenever the schedule says so, until ctrl-c.
pub async fn run_poll_loop(
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    settings: &ScanSettings,
    symbols: &[String],
) -> Result<()> {
    let schedule = ScanSchedule::from_settings(settings);
    let mut ticker = tokio::time::interval(Duration::from_secs(settings.schedule.poll_interval_secs));
    let mut last_bucket: Option<i64> = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    log::info!(
        "Polling {} symbols every {}s for {} bars",
        symbols.len(),
        settings.schedule.poll_interval_secs,
        settings.interval_label()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = now_timestamp_ms();
                if let Some(bucket) = schedule.due_bucket(now_ms, last_bucket) {
                    last_bucket = Some(bucket);
                    run_scan_cycle(Arc::clone(&source), notifier.as_ref(), settings, symbols, now_ms).await;
                }
            }
            result = &mut shutdown => {
                result?;
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_shutdown {
                    log::info!("Ctrl-c received, stopping poll loop");
                }
                return Ok(());
            }
        }
    }
}
