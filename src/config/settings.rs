//! Runtime settings, resolved once at startup.
//!
//! Resolution order: the compile-time defaults in `SCANNER` / `BINANCE`, then
//! an optional JSON file (a sparse overlay, any subset of fields), then CLI
//! flags (applied by the caller).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BINANCE, SCANNER};
use crate::analysis::{BreakoutParams, CrossoverParams, IndicatorParams, Strategy};
use crate::domain::SessionHours;
use crate::models::StrategyKind;
use crate::utils::TimeUtils;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UniverseSettings {
    pub min_share_price: f64,
    pub max_share_price: f64,
    pub min_daily_volume: f64,
    /// Candidate list is truncated to this many symbols
    pub max_symbols: usize,
}

impl UniverseSettings {
    pub fn accepts(&self, last_price: f64, prev_daily_volume: f64) -> bool {
        last_price >= self.min_share_price
            && last_price <= self.max_share_price
            && prev_daily_volume > self.min_daily_volume
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    pub poll_interval_secs: u64,
    pub run_offset_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub title: String,
    pub max_rows_per_message: usize,
    pub recent_rows: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub max_series_len: usize,
    pub channel_capacity: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscordSettings {
    /// Only ever taken from the CLI / environment, never from the file
    #[serde(skip)]
    pub token: Option<String>,
    pub channel_id: Option<String>,
    /// Post to Discord instead of printing
    pub post: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub strategy: Strategy,
    pub interval_ms: i64,
    /// History window re-fetched per scan
    pub lookback_ms: i64,
    pub symbols_file: PathBuf,
    pub universe: UniverseSettings,
    /// Keep only bars inside these local hours. Off for 24/7 markets.
    pub session: Option<SessionHours>,
    pub schedule: ScheduleSettings,
    pub report: ReportSettings,
    pub live: LiveSettings,
    pub discord: DiscordSettings,
}

impl ScanSettings {
    pub fn defaults_for(kind: StrategyKind) -> Self {
        let c = &SCANNER.crossover;
        let b = &SCANNER.breakout;

        let (strategy, interval_ms, lookback_ms, title, universe) = match kind {
            StrategyKind::Crossover => (
                Strategy::Crossover(CrossoverParams {
                    indicators: IndicatorParams {
                        fast_window: c.fast_window,
                        slow_window: c.slow_window,
                        rsi_period: c.rsi_period,
                    },
                    min_price_change: c.min_price_change,
                }),
                c.interval_ms,
                c.lookback_ms,
                c.title,
                &SCANNER.crossover_universe,
            ),
            StrategyKind::Breakout => (
                Strategy::Breakout(BreakoutParams {
                    indicators: IndicatorParams {
                        fast_window: c.fast_window,
                        slow_window: c.slow_window,
                        rsi_period: c.rsi_period,
                    },
                    trend_bars: b.trend_bars,
                    eval_bars: b.eval_bars,
                    min_bar_volume: b.min_bar_volume,
                    min_avg_percent_change: b.min_avg_percent_change,
                }),
                b.interval_ms,
                b.lookback_ms,
                b.title,
                &SCANNER.breakout_universe,
            ),
        };

        Self {
            strategy,
            interval_ms,
            lookback_ms,
            symbols_file: PathBuf::from(BINANCE.symbols_file),
            universe: UniverseSettings {
                min_share_price: universe.min_share_price,
                max_share_price: universe.max_share_price,
                min_daily_volume: universe.min_daily_volume,
                max_symbols: BINANCE.max_symbols,
            },
            session: None,
            schedule: ScheduleSettings {
                poll_interval_secs: SCANNER.schedule.poll_interval_secs,
                run_offset_secs: SCANNER.schedule.run_offset_secs,
            },
            report: ReportSettings {
                title: title.to_string(),
                max_rows_per_message: SCANNER.report.max_rows_per_message,
                recent_rows: SCANNER.report.recent_rows,
            },
            live: LiveSettings {
                max_series_len: SCANNER.live.max_series_len,
                channel_capacity: SCANNER.live.channel_capacity,
            },
            discord: DiscordSettings::default(),
        }
    }

    /// Defaults for `kind`, overlaid with the JSON file at `path` if given.
    pub fn load(kind: StrategyKind, path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::defaults_for(kind));
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let overlay: Value = serde_json::from_str(&text)
            .with_context(|| format!("Config file {} is not valid JSON", path.display()))?;
        Self::with_overlay(kind, overlay)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn with_overlay(kind: StrategyKind, overlay: Value) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::defaults_for(kind))?;
        merge_json(&mut merged, overlay);
        let settings: Self = serde_json::from_value(merged)?;
        ensure!(
            settings.strategy.kind() == kind,
            "config sets strategy kind '{}' but '{}' was requested",
            settings.strategy.kind(),
            kind
        );
        Ok(settings)
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn interval_label(&self) -> &'static str {
        TimeUtils::interval_to_string(self.interval_ms)
    }

    /// Reject settings no scan could run with.
    pub fn validate(&self) -> Result<()> {
        if TimeUtils::interval_from_str(self.interval_label()).is_none() {
            bail!("unsupported bar interval {} ms", self.interval_ms);
        }
        ensure!(self.lookback_ms >= self.interval_ms, "lookback shorter than one bar");

        let ind = self.strategy.indicator_params();
        ensure!(
            ind.fast_window > 0 && ind.slow_window > 0 && ind.rsi_period > 0,
            "indicator windows must be positive"
        );
        if let Strategy::Breakout(p) = &self.strategy {
            ensure!(p.trend_bars > 0 && p.eval_bars > 0, "breakout windows must be positive");
        }

        let u = &self.universe;
        ensure!(u.min_share_price <= u.max_share_price, "min_share_price > max_share_price");
        ensure!(u.max_symbols > 0, "max_symbols must be positive");

        if let Some(session) = &self.session {
            ensure!(
                session.start_hour < session.end_hour && session.end_hour <= 24,
                "session hours must satisfy start < end <= 24"
            );
        }
        ensure!(self.report.max_rows_per_message > 0, "max_rows_per_message must be positive");
        ensure!(self.schedule.poll_interval_secs > 0, "poll_interval_secs must be positive");
        ensure!(self.live.channel_capacity > 0, "channel_capacity must be positive");
        ensure!(
            self.live.max_series_len >= self.strategy.min_bars(),
            "max_series_len {} cannot hold the {} bars the strategy needs",
            self.live.max_series_len,
            self.strategy.min_bars()
        );

        if self.discord.post {
            ensure!(self.discord.token.is_some(), "posting needs a Discord token");
            ensure!(self.discord.channel_id.is_some(), "posting needs a Discord channel id");
        }
        Ok(())
    }
}

/// Recursively overlay `overlay` onto `base`. Objects merge key by key,
/// everything else replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
