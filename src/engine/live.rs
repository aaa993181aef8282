//! Live mode: stream closed bars, evaluate each symbol as its bars arrive.
//!
//! Every symbol gets its own task and channel; the task is the only writer of
//! that symbol's Series. The dispatcher here routes stream events and, on every
//! (re)connect, reloads history for all symbols before any newer bar reaches
//! them, so buffers stay contiguous across gaps in the stream.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::{Alert, SymbolCommand};
use super::poll::scan_window;
use super::state::SymbolState;
use super::worker::spawn_symbol_task;
use crate::config::BINANCE;
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::config::settings::ScanSettings;
use crate::data::{MarketDataSource, StreamEvent, fetch_histories};
use crate::domain::SymbolInterval;
use crate::models::Series;
use crate::notify::Notifier;
use crate::utils::time_utils::now_timestamp_ms;

/// Counters for one live session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LiveSummary {
    pub reloads: usize,
    pub bars_routed: usize,
    pub alerts_delivered: usize,
}

/// Delivers alerts one at a time, in arrival order. Returns how many got through.
fn spawn_notifier_task(
    notifier: Arc<dyn Notifier>,
    channel_id: String,
    mut rx: mpsc::Receiver<Alert>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        while let Some(alert) = rx.recv().await {
            match notifier.send(&channel_id, &alert.text).await {
                Ok(()) => delivered += 1,
                Err(e) => log::error!(
                    "{}: alert for {} not delivered: {}",
                    notifier.signature(),
                    alert.signal.symbol,
                    e
                ),
            }
        }
        delivered
    })
}

struct Dispatcher {
    source: Arc<dyn MarketDataSource>,
    settings: Arc<ScanSettings>,
    symbols: Vec<String>,
    senders: HashMap<String, mpsc::Sender<SymbolCommand>>,
    summary: LiveSummary,
}

impl Dispatcher {
    /// Fresh history for every symbol, closed bars only: the bar still open at
    /// `now_ms` comes in from the stream when it closes. A symbol whose load
    /// fails restarts from an empty buffer rather than keep bars with a gap
    /// behind them.
    async fn reload_all(&mut self, now_ms: i64) {
        let window = scan_window(&self.settings, now_ms);
        let loaded = fetch_histories(
            Arc::clone(&self.source),
            &self.symbols,
            window,
            BINANCE.limits.simultaneous_calls_ceiling,
        )
        .await;
        let mut by_symbol: HashMap<String, Series> = loaded
            .into_iter()
            .map(|s| (s.symbol().to_string(), s))
            .collect();

        for (symbol, tx) in &self.senders {
            let series = by_symbol.remove(symbol).unwrap_or_else(|| {
                Series::new(SymbolInterval::new(symbol.as_str(), self.settings.interval_ms))
            });
            if tx.send(SymbolCommand::Reload(series)).await.is_err() {
                log::warn!("{}: task gone, reload dropped", symbol);
            }
        }
        self.summary.reloads += 1;
    }

    async fn route(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected => {
                log::info!("Stream connected, reloading history for {} symbols", self.symbols.len());
                self.reload_all(now_timestamp_ms()).await;
            }
            StreamEvent::Bar(update) => {
                let Some(tx) = self.senders.get(&update.symbol) else {
                    #[cfg(debug_assertions)]
                    if DEBUG_FLAGS.print_stream_updates {
                        log::info!("Bar for untracked symbol {}", update.symbol);
                    }
                    return;
                };
                if tx.send(SymbolCommand::Bar(update.bar)).await.is_err() {
                    log::warn!("{}: task gone, bar dropped", update.symbol);
                    return;
                }
                self.summary.bars_routed += 1;
            }
            StreamEvent::Disconnected(reason) => {
                log::warn!("Stream disconnected: {}", reason);
            }
        }
    }
}

/// Run until `shutdown` resolves or the subscription ends.
pub async fn run_live<F>(
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<ScanSettings>,
    symbols: Vec<String>,
    shutdown: F,
) -> Result<LiveSummary>
where
    F: Future<Output = ()>,
{
    if symbols.is_empty() {
        bail!("live mode needs at least one symbol");
    }

    let (alert_tx, alert_rx) = mpsc::channel::<Alert>(settings.live.channel_capacity);
    let channel_id = settings.discord.channel_id.clone().unwrap_or_default();
    let notifier_task = spawn_notifier_task(notifier, channel_id, alert_rx);

    let mut senders = HashMap::with_capacity(symbols.len());
    let mut workers = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        let (tx, rx) = mpsc::channel::<SymbolCommand>(settings.live.channel_capacity);
        let state = SymbolState::new(Series::new(SymbolInterval::new(
            symbol.as_str(),
            settings.interval_ms,
        )));
        workers.push(spawn_symbol_task(state, rx, alert_tx.clone(), Arc::clone(&settings)));
        senders.insert(symbol.clone(), tx);
    }
    // Workers hold the remaining senders; the notifier task ends after the last worker
    drop(alert_tx);

    let mut events = source
        .subscribe(&symbols, settings.interval_ms)
        .with_context(|| format!("{}: subscribe failed", source.signature()))?;
    log::info!(
        "Live {} scan on {} symbols at {} via {}",
        settings.kind(),
        symbols.len(),
        settings.interval_label(),
        source.signature()
    );

    let mut dispatcher = Dispatcher {
        source,
        settings,
        symbols,
        senders,
        summary: LiveSummary::default(),
    };

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => dispatcher.route(event).await,
                None => {
                    log::warn!("Stream subscription ended");
                    break;
                }
            },
            _ = &mut shutdown => {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_shutdown {
                    log::info!("Shutdown requested, stopping live scan");
                }
                break;
            }
        }
    }

    // Closing the command channels lets every worker drain and exit
    let Dispatcher { mut summary, senders, .. } = dispatcher;
    drop(senders);
    drop(events);
    for worker in workers {
        if let Err(e) = worker.await {
            log::error!("Symbol task failed: {:?}", e);
        }
    }
    summary.alerts_delivered = notifier_task.await.context("notifier task failed")?;

    log::info!(
        "Live scan stopped: {} reloads, {} bars, {} alerts delivered",
        summary.reloads,
        summary.bars_routed,
        summary.alerts_delivered
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BarUpdate, InMemorySource};
    use crate::domain::Bar;
    use crate::models::StrategyKind;
    use crate::notify::recording::RecordingNotifier;
    use crate::utils::TimeUtils;

    const M: i64 = TimeUtils::MS_IN_MIN;

    fn bar(minute: i64, close: f64, volume: f64) -> Bar {
        Bar::new(minute * M, close, close, close, close, volume)
    }

    fn history(base_minute: i64) -> Vec<Bar> {
        (0..20).map(|i| bar(base_minute + i, 10.0, 500.0)).collect()
    }

    fn update(symbol: &str, bar: Bar) -> StreamEvent {
        StreamEvent::Bar(BarUpdate {
            symbol: symbol.to_string(),
            bar,
        })
    }

    #[tokio::test]
    async fn routes_bars_and_alerts_on_breakout() {
        // History sits just before "now" so the reload window picks it up
        let base = now_timestamp_ms() / M - 20;
        let (tx, rx) = mpsc::channel(16);
        let source: Arc<dyn MarketDataSource> = Arc::new(
            InMemorySource::new()
                .with_bars("AAA", M, history(base))
                .with_bars("BBB", M, history(base))
                .with_failure("CCC")
                .with_stream(rx),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = Arc::new(ScanSettings::defaults_for(StrategyKind::Breakout));
        let symbols: Vec<String> = ["AAA", "BBB", "CCC"].iter().map(|s| s.to_string()).collect();

        tx.send(StreamEvent::Connected).await.unwrap();
        tx.send(update("AAA", bar(base + 20, 11.0, 5_000.0))).await.unwrap();
        tx.send(update("BBB", bar(base + 20, 10.0, 5_000.0))).await.unwrap();
        tx.send(update("ZZZ", bar(base + 20, 99.0, 5_000.0))).await.unwrap();
        tx.send(StreamEvent::Disconnected("test".to_string())).await.unwrap();
        // Reconnect: history reload, then the same AAA bar again must not re-alert
        tx.send(StreamEvent::Connected).await.unwrap();
        tx.send(update("AAA", bar(base + 20, 11.0, 5_000.0))).await.unwrap();
        // CCC has no history; a lone bar cannot fire
        tx.send(update("CCC", bar(base + 20, 50.0, 9_000.0))).await.unwrap();
        drop(tx);

        let summary = run_live(
            source,
            notifier.clone(),
            settings,
            symbols,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

        assert_eq!(summary.reloads, 2);
        assert_eq!(summary.bars_routed, 4);
        assert_eq!(summary.alerts_delivered, 1);

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Price Momentum Alert: AAA"));
    }

    #[tokio::test]
    async fn reload_stops_before_the_open_bar() {
        let now = 41 * M + 5_000;
        let mut bars: Vec<Bar> = (20..=40).map(|minute| bar(minute, 10.0, 500.0)).collect();
        // Minute 41 is still forming at `now`
        bars.push(bar(41, 10.2, 120.0));
        let source: Arc<dyn MarketDataSource> =
            Arc::new(InMemorySource::new().with_bars("AAA", M, bars));
        let settings = Arc::new(ScanSettings::defaults_for(StrategyKind::Breakout));

        let (tx, mut rx) = mpsc::channel(4);
        let mut dispatcher = Dispatcher {
            source,
            settings: Arc::clone(&settings),
            symbols: vec!["AAA".to_string()],
            senders: HashMap::from([("AAA".to_string(), tx)]),
            summary: LiveSummary::default(),
        };
        dispatcher.reload_all(now).await;
        assert_eq!(dispatcher.summary.reloads, 1);

        let Some(SymbolCommand::Reload(series)) = rx.recv().await else {
            panic!("expected a reload");
        };
        assert_eq!(series.last_open_time_ms(), Some(40 * M));

        // The closed minute-41 bar then lands in the buffer and can alert
        let mut state = SymbolState::new(Series::new(SymbolInterval::new("AAA", M)));
        assert!(state.apply(SymbolCommand::Reload(series), &settings).is_none());
        let alert = state.apply(SymbolCommand::Bar(bar(41, 11.0, 5_000.0)), &settings);
        assert_eq!(alert.map(|a| a.signal.open_time_ms), Some(41 * M));
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let (tx, rx) = mpsc::channel(4);
        let source: Arc<dyn MarketDataSource> = Arc::new(InMemorySource::new().with_stream(rx));
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = Arc::new(ScanSettings::defaults_for(StrategyKind::Crossover));

        let summary = run_live(source, notifier, settings, vec!["AAA".to_string()], async {})
            .await
            .unwrap();
        assert_eq!(summary, LiveSummary::default());
        drop(tx);
    }

    #[tokio::test]
    async fn needs_symbols() {
        let source: Arc<dyn MarketDataSource> = Arc::new(InMemorySource::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = Arc::new(ScanSettings::defaults_for(StrategyKind::Crossover));
        assert!(
            run_live(source, notifier, settings, Vec::new(), async {})
                .await
                .is_err()
        );
    }
}
