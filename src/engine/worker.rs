use std::sync::Arc;

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;

use super::messages::{Alert, SymbolCommand};
use super::state::SymbolState;
use crate::config::settings::ScanSettings;

/// One task per symbol: drains its command channel, forwards alerts.
/// Ends when the command channel closes.
pub fn spawn_symbol_task(
    mut state: SymbolState,
    mut rx: Receiver<SymbolCommand>,
    alerts: Sender<Alert>,
    settings: Arc<ScanSettings>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            if let Some(alert) = state.apply(command, &settings) {
                log::info!("ALERT {}", alert.signal.description());
                if alerts.send(alert).await.is_err() {
                    log::warn!("{}: alert channel closed", state.series.symbol());
                    break;
                }
            }
        }
    })
}
