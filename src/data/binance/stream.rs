//! Live closed-bar updates from the Binance combined kline stream.

use std::time::Duration;

use anyhow::{Result, bail};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::BINANCE;
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::data::source::{BarUpdate, StreamEvent};
use crate::domain::Bar;
use crate::utils::TimeUtils;

#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time_ms: i64,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
    #[serde(rename = "x")]
    is_closed: bool,
}

#[derive(Debug, Deserialize)]
struct KlineEvent {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    kline: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct CombinedStreamMessage {
    #[serde(rename = "stream")]
    _stream: String,
    data: KlineEvent,
}

/// Why a connection ended.
enum StreamExit {
    /// Server closed the socket (e.g. the 24h limit)
    Closed,
    /// Nobody is listening any more
    ReceiverGone,
}

/// Decode one combined-stream text frame. `Ok(None)` for bars still in progress.
pub fn parse_kline_message(text: &str) -> Result<Option<BarUpdate>> {
    let wrapper: CombinedStreamMessage = serde_json::from_str(text)?;
    let k = wrapper.data.kline;
    if !k.is_closed {
        return Ok(None);
    }
    let bar = Bar::new(
        k.open_time_ms,
        k.open.parse()?,
        k.high.parse()?,
        k.low.parse()?,
        k.close.parse()?,
        k.volume.parse()?,
    );
    Ok(Some(BarUpdate {
        symbol: wrapper.data.symbol.to_uppercase(),
        bar,
    }))
}

pub fn build_combined_stream_url(symbols: &[String], interval_ms: i64) -> Result<String> {
    let interval = TimeUtils::interval_to_string(interval_ms);
    if TimeUtils::interval_from_str(interval).is_none() {
        bail!("no kline stream for interval {} ms", interval_ms);
    }
    if symbols.is_empty() {
        bail!("no symbols to stream");
    }
    let stream_descriptor = symbols
        .iter()
        .map(|symbol| format!("{}@kline_{}", symbol.to_lowercase(), interval))
        .collect::<Vec<_>>()
        .join("/");

    Ok(format!("{}{}", BINANCE.ws.combined_base_url, stream_descriptor))
}

/// Wait before the next reconnect: doubles after each failure up to the cap,
/// back to the initial delay once a connection has held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBackoff {
    delay_sec: u64,
    initial_sec: u64,
    max_sec: u64,
}

impl ReconnectBackoff {
    pub fn new(initial_sec: u64, max_sec: u64) -> Self {
        Self {
            delay_sec: initial_sec,
            initial_sec,
            max_sec,
        }
    }

    /// Seconds to wait now; the next failure waits twice as long.
    pub fn on_failure(&mut self) -> u64 {
        let wait = self.delay_sec;
        self.delay_sec = self.delay_sec.saturating_mul(2).min(self.max_sec);
        wait
    }

    pub fn reset(&mut self) {
        self.delay_sec = self.initial_sec;
    }
}

/// Reconnect loop with exponential backoff. Returns once `tx` is closed.
pub async fn run_kline_stream_with_reconnect(url: String, tx: mpsc::Sender<StreamEvent>) {
    let mut backoff = ReconnectBackoff::new(
        BINANCE.ws.initial_reconnect_delay_sec,
        BINANCE.ws.max_reconnect_delay_sec,
    );

    loop {
        match run_kline_stream(&url, &tx).await {
            Ok(StreamExit::ReceiverGone) => {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_stream_updates {
                    log::info!("Kline stream receiver dropped, stopping");
                }
                return;
            }
            Ok(StreamExit::Closed) => {
                log::info!("Kline stream closed by server, reconnecting...");
                if tx
                    .send(StreamEvent::Disconnected("closed by server".to_string()))
                    .await
                    .is_err()
                {
                    return;
                }
                // Reset delay on successful connection that later closes
                backoff.reset();
            }
            Err(e) => {
                log::error!("Kline stream error: {}", e);
                if tx.send(StreamEvent::Disconnected(e.to_string())).await.is_err() {
                    return;
                }
                let wait = backoff.on_failure();
                log::info!("Reconnecting kline stream in {} seconds...", wait);
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
        }

        // Small delay before reconnecting even on normal close
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn run_kline_stream(
    url: &str,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<StreamExit, Box<dyn std::error::Error + Send + Sync>> {
    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_stream_updates {
        log::info!("Connecting to Binance combined WebSocket: {}", url);
    }

    let (ws_stream, _) = connect_async(url).await?;
    if tx.send(StreamEvent::Connected).await.is_err() {
        return Ok(StreamExit::ReceiverGone);
    }
    log::info!("✓ Connected to kline stream");

    let (_write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => match parse_kline_message(&text) {
                Ok(Some(update)) => {
                    #[cfg(debug_assertions)]
                    if DEBUG_FLAGS.print_stream_updates {
                        log::info!("[kline-stream] {} close {:.6}", update.symbol, update.bar.close);
                    }
                    if tx.send(StreamEvent::Bar(update)).await.is_err() {
                        return Ok(StreamExit::ReceiverGone);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("⚠️ Unexpected kline payload ({}): {}", e, text);
                }
            },
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // WebSocket keepalive - handled automatically
            }
            Ok(Message::Close(_)) => {
                return Ok(StreamExit::Closed);
            }
            Err(e) => {
                return Err(e.into());
            }
            _ => {}
        }
    }

    Ok(StreamExit::Closed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSED: &str = r#"{"stream":"btcusdt@kline_1m","data":{"e":"kline","E":1700000060000,"s":"BTCUSDT","k":{"t":1700000000000,"T":1700000059999,"s":"BTCUSDT","i":"1m","o":"100.0","c":"101.5","h":"102.0","l":"99.5","v":"12.25","n":10,"x":true,"q":"1234.5"}}}"#;

    #[test]
    fn parses_closed_bars_only() {
        let update = parse_kline_message(CLOSED).unwrap().unwrap();
        assert_eq!(update.symbol, "BTCUSDT");
        assert_eq!(update.bar, Bar::new(1_700_000_000_000, 100.0, 102.0, 99.5, 101.5, 12.25));

        let open = CLOSED.replace("\"x\":true", "\"x\":false");
        assert!(parse_kline_message(&open).unwrap().is_none());
        assert!(parse_kline_message("{\"result\":null,\"id\":1}").is_err());
    }

    #[test]
    fn builds_stream_url() {
        let url = build_combined_stream_url(
            &["BTCUSDT".to_string(), "ethusdt".to_string()],
            TimeUtils::MS_IN_MIN,
        )
        .unwrap();
        assert_eq!(
            url,
            "wss://stream.binance.com:9443/stream?streams=btcusdt@kline_1m/ethusdt@kline_1m"
        );
        assert!(build_combined_stream_url(&[], TimeUtils::MS_IN_MIN).is_err());
        assert!(build_combined_stream_url(&["X".to_string()], 7).is_err());
    }

    #[test]
    fn backoff_doubles_to_the_cap_and_resets() {
        let mut backoff = ReconnectBackoff::new(
            BINANCE.ws.initial_reconnect_delay_sec,
            BINANCE.ws.max_reconnect_delay_sec,
        );
        let waits: Vec<u64> = (0..11).map(|_| backoff.on_failure()).collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 16, 32, 64, 128, 256, 300, 300]);

        backoff.reset();
        assert_eq!(backoff.on_failure(), 1);
        assert_eq!(backoff.on_failure(), 2);
    }
}
