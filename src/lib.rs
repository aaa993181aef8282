#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod notify;
pub mod report;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;

// Re-export commonly used types
pub use analysis::{Evaluation, Strategy};
pub use config::ScanSettings;
pub use data::{BinanceSource, MarketDataSource};
pub use domain::{Bar, SymbolInterval};
pub use models::{Series, Signal, StrategyKind};
pub use notify::Notifier;

use config::BINANCE;
use data::discover_symbols;
use notify::{ConsoleNotifier, DiscordNotifier};
use utils::TimeUtils;
use utils::time_utils::now_timestamp_ms;

// CLI argument parsing
use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Scan once and exit
    Once,
    /// Rescan on a schedule until ctrl-c
    Poll,
    /// Stream closed bars and evaluate as they arrive
    Live,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Market-data scanners with chat alerts", long_about = None)]
pub struct Cli {
    /// Scanner to run: crossover or breakout
    pub strategy: StrategyKind,

    #[arg(long, value_enum, default_value_t = RunMode::Once)]
    pub mode: RunMode,

    /// JSON file overriding any subset of the settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Candidate symbols, one per line
    #[arg(long)]
    pub symbols_file: Option<PathBuf>,

    /// Scan these symbols as given, skipping the universe screen
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Bar interval, e.g. 1m, 15m, 1h, 1d
    #[arg(long)]
    pub interval: Option<String>,

    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: Option<String>,

    #[arg(long, env = "DISCORD_CHANNEL")]
    pub channel: Option<String>,

    /// Post alerts to Discord (default: print them)
    #[arg(long, default_value_t = false)]
    pub post: bool,
}

impl Cli {
    /// Defaults, then the config file, then these flags.
    pub fn settings(&self) -> Result<ScanSettings> {
        let mut settings = ScanSettings::load(self.strategy, self.config.as_deref())?;

        if let Some(path) = &self.symbols_file {
            settings.symbols_file = path.clone();
        }
        if let Some(text) = &self.interval {
            settings.interval_ms = TimeUtils::interval_from_str(text)
                .ok_or_else(|| anyhow!("unknown interval '{}'", text))?;
        }
        if self.discord_token.is_some() {
            settings.discord.token = self.discord_token.clone();
        }
        if self.channel.is_some() {
            settings.discord.channel_id = self.channel.clone();
        }
        settings.discord.post |= self.post;

        settings.validate().context("invalid settings")?;
        Ok(settings)
    }

    /// `--symbols`, normalised. Empty means "run the universe screen".
    pub fn explicit_symbols(&self) -> Vec<String> {
        self.symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unique()
            .collect()
    }
}

fn build_notifier(settings: &ScanSettings) -> Result<Arc<dyn Notifier>> {
    if !settings.discord.post {
        return Ok(Arc::new(ConsoleNotifier));
    }
    let token = settings
        .discord
        .token
        .clone()
        .context("posting needs a Discord token")?;
    Ok(Arc::new(DiscordNotifier::new(token)))
}

/// Main application entry point, called by the binary inside a Tokio runtime.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;
    log::info!(
        "{} scanner, {} bars, {} mode",
        settings.kind(),
        settings.interval_label(),
        format!("{:?}", cli.mode).to_lowercase()
    );

    let source: Arc<dyn MarketDataSource> = Arc::new(BinanceSource::new(
        settings.symbols_file.clone(),
        settings.live.channel_capacity,
    ));
    let notifier = build_notifier(&settings)?;

    let symbols = match cli.explicit_symbols() {
        explicit if !explicit.is_empty() => explicit,
        _ => discover_symbols(
            Arc::clone(&source),
            &settings.universe,
            now_timestamp_ms(),
            BINANCE.limits.simultaneous_calls_ceiling,
        )
        .await
        .context("symbol discovery failed")?,
    };

    match cli.mode {
        RunMode::Once => {
            engine::run_scan_cycle(source, notifier.as_ref(), &settings, &symbols, now_timestamp_ms())
                .await;
            Ok(())
        }
        RunMode::Poll => engine::run_poll_loop(source, notifier, &settings, &symbols).await,
        RunMode::Live => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for ctrl-c: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            engine::run_live(source, notifier, Arc::new(settings), symbols, shutdown)
                .await
                .map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let cli = Cli::parse_from([
            "market-scanner",
            "breakout",
            "--mode",
            "live",
            "--interval",
            "5m",
            "--symbols",
            "btcusdt, ethusdt",
            "--channel",
            "123",
        ]);
        assert_eq!(cli.strategy, StrategyKind::Breakout);
        assert_eq!(cli.mode, RunMode::Live);
        assert_eq!(cli.explicit_symbols(), vec!["BTCUSDT", "ETHUSDT"]);

        let settings = cli.settings().unwrap();
        assert_eq!(settings.interval_ms, TimeUtils::MS_IN_5_MIN);
        assert_eq!(settings.discord.channel_id.as_deref(), Some("123"));
        assert!(!settings.discord.post);
    }

    #[test]
    fn bad_interval_is_rejected() {
        let cli = Cli::parse_from(["market-scanner", "crossover", "--interval", "7m"]);
        assert!(cli.settings().is_err());
    }

    #[test]
    fn console_notifier_unless_posting() {
        let settings = ScanSettings::defaults_for(StrategyKind::Crossover);
        assert_eq!(build_notifier(&settings).unwrap().signature(), "Console");
    }
}
