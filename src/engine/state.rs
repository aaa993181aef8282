use crate::analysis::Strategy;
#[cfg(debug_assertions)]
use crate::analysis::evaluator::breakout_stats;
use crate::config::settings::ScanSettings;
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::domain::Bar;
use crate::models::{IndicatorRow, PushOutcome, Series, Signal};
use crate::report::{render_recent_bars, render_report};

use super::messages::{Alert, SymbolCommand};

/// Live state of a single symbol, owned by its task.
#[derive(Debug, Clone)]
pub struct SymbolState {
    pub series: Series,
    /// Open time of the bar we last alerted on, so a replaced bar never alerts twice
    pub last_alert_open_time_ms: Option<i64>,
}

impl SymbolState {
    pub fn new(series: Series) -> Self {
        Self {
            series,
            last_alert_open_time_ms: None,
        }
    }

    /// Apply one command. Only a live bar that lands in the buffer can alert.
    pub fn apply(&mut self, command: SymbolCommand, settings: &ScanSettings) -> Option<Alert> {
        match command {
            SymbolCommand::Reload(mut series) => {
                if let Some(session) = &settings.session {
                    series.retain_session(session);
                }
                series.cap_len(settings.live.max_series_len);
                log::debug!("{} reloaded with {} bars", series.symbol_interval, series.len());
                self.series = series;
                None
            }
            SymbolCommand::Bar(bar) => self.on_bar(bar, settings),
        }
    }

    fn on_bar(&mut self, bar: Bar, settings: &ScanSettings) -> Option<Alert> {
        if let Some(session) = &settings.session {
            if !session.contains(bar.open_time_ms) {
                return None;
            }
        }
        if self.series.push(bar) == PushOutcome::Stale {
            return None;
        }
        self.series.cap_len(settings.live.max_series_len);

        let evaluation = settings.strategy.evaluate_series(&self.series);
        self.debug_rows(&evaluation.rows, settings);

        let signal = evaluation.signal?;
        if self.last_alert_open_time_ms == Some(signal.open_time_ms) {
            return None;
        }
        self.last_alert_open_time_ms = Some(signal.open_time_ms);

        let text = render_alert(settings, &signal, &evaluation.rows);
        Some(Alert { signal, text })
    }

    #[cfg(debug_assertions)]
    fn debug_rows(&self, rows: &[IndicatorRow], settings: &ScanSettings) {
        if DEBUG_FLAGS.print_breakout_stats {
            if let Strategy::Breakout(params) = &settings.strategy {
                log::info!("{} {:?}", self.series.symbol(), breakout_stats(rows, params));
            }
        }
        if DEBUG_FLAGS.print_rows_for_symbol == self.series.symbol() {
            let start = rows.len().saturating_sub(settings.report.recent_rows);
            for row in &rows[start..] {
                log::info!("{} {:?}", self.series.symbol(), row);
            }
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_rows(&self, _rows: &[IndicatorRow], _settings: &ScanSettings) {}
}

/// Breakouts show the recent bars with their Heiken-Ashi candles; other
/// strategies use the one-row signal table.
pub fn render_alert(settings: &ScanSettings, signal: &Signal, rows: &[IndicatorRow]) -> String {
    match settings.strategy {
        Strategy::Breakout(_) => render_recent_bars(
            &settings.report.title,
            &signal.symbol,
            rows,
            settings.report.recent_rows,
        ),
        Strategy::Crossover(_) => render_report(
            &settings.report.title,
            std::slice::from_ref(signal),
            settings.report.max_rows_per_message,
        )
        .concat(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymbolInterval;
    use crate::models::StrategyKind;
    use crate::utils::TimeUtils;

    const M: i64 = TimeUtils::MS_IN_MIN;

    fn flat_series(n: i64) -> Series {
        let bars = (0..n).map(|i| Bar::new(i * M, 10.0, 10.0, 10.0, 10.0, 500.0)).collect();
        Series::from_bars(SymbolInterval::new("AAA", M), bars)
    }

    #[test]
    fn breakout_bar_alerts_once() {
        let settings = ScanSettings::defaults_for(StrategyKind::Breakout);
        let mut state = SymbolState::new(Series::new(SymbolInterval::new("AAA", M)));
        assert!(state.apply(SymbolCommand::Reload(flat_series(20)), &settings).is_none());

        let pop = Bar::new(20 * M, 10.0, 11.5, 10.0, 11.0, 5_000.0);
        let alert = state.apply(SymbolCommand::Bar(pop), &settings).unwrap();
        assert_eq!(alert.signal.symbol, "AAA");
        assert!(alert.text.contains("Price Momentum Alert: AAA"));
        assert!(alert.text.contains("ha_open"));

        // Same bar again: replaced, but already alerted
        assert!(state.apply(SymbolCommand::Bar(pop), &settings).is_none());
        // Older bar: ignored
        assert!(state.apply(SymbolCommand::Bar(Bar::new(3 * M, 1.0, 1.0, 1.0, 1.0, 1.0)), &settings).is_none());
        assert_eq!(state.series.len(), 21);
    }

    #[test]
    fn buffer_is_capped() {
        let mut settings = ScanSettings::defaults_for(StrategyKind::Breakout);
        settings.live.max_series_len = 15;
        let mut state = SymbolState::new(Series::new(SymbolInterval::new("AAA", M)));
        state.apply(SymbolCommand::Reload(flat_series(40)), &settings);
        assert_eq!(state.series.len(), 15);
        state.apply(SymbolCommand::Bar(Bar::new(40 * M, 10.0, 10.0, 10.0, 10.0, 1.0)), &settings);
        assert_eq!(state.series.len(), 15);
        assert_eq!(state.series.last_open_time_ms(), Some(40 * M));
    }
}
