//! Symbol discovery: candidate list, then a price / liquidity screen on daily bars.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use super::history::{HistoryWindow, fetch_histories};
use super::source::MarketDataSource;
use crate::config::settings::UniverseSettings;
use crate::models::Series;
use crate::utils::TimeUtils;
use crate::utils::time_utils::floor_to_interval;

/// Latest price and the volume of the last completed day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySnapshot {
    pub last_price: f64,
    pub prev_daily_volume: f64,
}

impl DailySnapshot {
    /// `today_open_ms` is the open of the (incomplete) current daily bar.
    pub fn from_daily_series(series: &Series, today_open_ms: i64) -> Option<Self> {
        let last_price = series.last()?.close;
        let prev_daily_volume = series
            .bars()
            .iter()
            .rev()
            .find(|b| b.open_time_ms < today_open_ms)?
            .volume;
        Some(Self {
            last_price,
            prev_daily_volume,
        })
    }
}

/// Candidate symbols that pass `universe`, sorted.
pub async fn discover_symbols(
    source: Arc<dyn MarketDataSource>,
    universe: &UniverseSettings,
    now_ms: i64,
    batch_size: usize,
) -> Result<Vec<String>> {
    let candidates: Vec<String> = source
        .list_symbols()
        .await
        .with_context(|| format!("{}: failed to list symbols", source.signature()))?
        .into_iter()
        .take(universe.max_symbols)
        .collect();
    if candidates.is_empty() {
        bail!("{}: no candidate symbols", source.signature());
    }

    let today_open_ms = floor_to_interval(now_ms, TimeUtils::MS_IN_D);
    let window = HistoryWindow {
        from_ms: today_open_ms - 3 * TimeUtils::MS_IN_D,
        to_ms: now_ms,
        interval_ms: TimeUtils::MS_IN_D,
    };
    let daily = fetch_histories(source, &candidates, window, batch_size).await;

    let mut passed = Vec::new();
    for series in &daily {
        match DailySnapshot::from_daily_series(series, today_open_ms) {
            Some(snap) if universe.accepts(snap.last_price, snap.prev_daily_volume) => {
                passed.push(series.symbol().to_string());
            }
            Some(snap) => log::debug!(
                "{} screened out (price {:.4}, prev-day volume {:.0})",
                series.symbol(),
                snap.last_price,
                snap.prev_daily_volume
            ),
            None => log::warn!("{}: no completed daily bar, skipping", series.symbol()),
        }
    }

    log::info!(
        "{}/{} candidates pass the screen (price {}..={}, prev-day volume > {})",
        passed.len(),
        candidates.len(),
        universe.min_share_price,
        universe.max_share_price,
        universe.min_daily_volume
    );
    if passed.is_empty() {
        bail!("no symbols passed the universe screen");
    }
    Ok(passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemorySource;
    use crate::domain::{Bar, SymbolInterval};

    const D: i64 = TimeUtils::MS_IN_D;

    fn daily(closes_volumes: &[(f64, f64)], first_day: i64) -> Vec<Bar> {
        closes_volumes
            .iter()
            .enumerate()
            .map(|(i, &(c, v))| Bar::new((first_day + i as i64) * D, c, c, c, c, v))
            .collect()
    }

    fn universe() -> UniverseSettings {
        UniverseSettings {
            min_share_price: 5.0,
            max_share_price: 500.0,
            min_daily_volume: 1_000.0,
            max_symbols: 10,
        }
    }

    #[test]
    fn snapshot_uses_previous_completed_day() {
        let series = Series::from_bars(
            SymbolInterval::new("AAA", D),
            daily(&[(10.0, 5_000.0), (11.0, 7_000.0), (12.0, 50.0)], 8),
        );
        // Day 10 is still open
        let snap = DailySnapshot::from_daily_series(&series, 10 * D).unwrap();
        assert_eq!(snap.last_price, 12.0);
        assert_eq!(snap.prev_daily_volume, 7_000.0);

        let only_today = Series::from_bars(SymbolInterval::new("AAA", D), daily(&[(1.0, 1.0)], 10));
        assert!(DailySnapshot::from_daily_series(&only_today, 10 * D).is_none());
    }

    #[tokio::test]
    async fn screens_by_price_and_volume() {
        let now = 10 * D + 3_600_000;
        let source: Arc<dyn MarketDataSource> = Arc::new(
            InMemorySource::new()
                .with_bars("GOOD", D, daily(&[(20.0, 2_000.0), (21.0, 100.0)], 9))
                .with_bars("CHEAP", D, daily(&[(1.0, 2_000.0), (1.0, 100.0)], 9))
                .with_bars("THIN", D, daily(&[(20.0, 10.0), (21.0, 100.0)], 9))
                .with_failure("BROKEN"),
        );
        let passed = discover_symbols(source, &universe(), now, 4).await.unwrap();
        assert_eq!(passed, vec!["GOOD".to_string()]);
    }

    #[tokio::test]
    async fn empty_screen_is_an_error() {
        let source: Arc<dyn MarketDataSource> = Arc::new(
            InMemorySource::new().with_bars("CHEAP", D, daily(&[(1.0, 2_000.0), (1.0, 100.0)], 9)),
        );
        assert!(discover_symbols(source, &universe(), 10 * D + 1, 4).await.is_err());
    }
}
