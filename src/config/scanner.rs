//! Scanner defaults: strategy parameters, universe screen, report and schedule.

use crate::utils::TimeUtils;

/// Moving-average crossover scan
pub struct CrossoverDefaults {
    pub interval_ms: i64,
    // How far back each poll re-fetches
    pub lookback_ms: i64,
    pub fast_window: usize,
    pub slow_window: usize,
    pub rsi_period: usize,
    // Absolute close change the crossing bar must exceed
    pub min_price_change: f64,
    pub title: &'static str,
}

/// Volume / price breakout scan
pub struct BreakoutDefaults {
    pub interval_ms: i64,
    pub lookback_ms: i64,
    pub trend_bars: usize,
    pub eval_bars: usize,
    pub min_bar_volume: f64,
    // Percent, i.e. 5.0 means +5 %
    pub min_avg_percent_change: f64,
    pub title: &'static str,
}

/// Price and liquidity screen applied before scanning
pub struct UniverseDefaults {
    pub min_share_price: f64,
    pub max_share_price: f64,
    /// Previous completed daily bar volume must exceed this
    pub min_daily_volume: f64,
}

pub struct ReportDefaults {
    pub max_rows_per_message: usize,
    /// Rows shown under a live breakout alert
    pub recent_rows: usize,
}

pub struct ScheduleDefaults {
    pub poll_interval_secs: u64,
    // A bar interval must be this old before poll mode scans it
    pub run_offset_secs: u64,
}

pub struct LiveDefaults {
    /// Bars kept per symbol while streaming
    pub max_series_len: usize,
    /// Buffer of each per-symbol channel
    pub channel_capacity: usize,
}

/// The Master Scanner Configuration
pub struct ScannerConfig {
    pub crossover: CrossoverDefaults,
    pub breakout: BreakoutDefaults,
    pub crossover_universe: UniverseDefaults,
    pub breakout_universe: UniverseDefaults,
    pub report: ReportDefaults,
    pub schedule: ScheduleDefaults,
    pub live: LiveDefaults,
    /// Discord REST endpoint root
    pub discord_api_base: &'static str,
}

pub const SCANNER: ScannerConfig = ScannerConfig {
    crossover: CrossoverDefaults {
        interval_ms: TimeUtils::MS_IN_H,
        lookback_ms: TimeUtils::MS_IN_W,
        fast_window: 13,
        slow_window: 30,
        rsi_period: 14,
        min_price_change: 0.10,
        title: "13/30 Moving Average Crossover - ALERT",
    },
    breakout: BreakoutDefaults {
        interval_ms: TimeUtils::MS_IN_MIN,
        lookback_ms: TimeUtils::MS_IN_D,
        trend_bars: 10,
        eval_bars: 1,
        min_bar_volume: 2_000.0,
        min_avg_percent_change: 5.0,
        title: "Price Momentum Alert",
    },
    crossover_universe: UniverseDefaults {
        min_share_price: 5.0,
        max_share_price: 500.0,
        min_daily_volume: 2_000_000.0,
    },
    breakout_universe: UniverseDefaults {
        min_share_price: 0.5,
        max_share_price: 20.0,
        min_daily_volume: 100_000.0,
    },
    report: ReportDefaults {
        max_rows_per_message: 10,
        recent_rows: 5,
    },
    schedule: ScheduleDefaults {
        poll_interval_secs: 30,
        run_offset_secs: 60,
    },
    live: LiveDefaults {
        max_series_len: 1_500,
        channel_capacity: 64,
    },
    discord_api_base: "https://discord.com/api/v10",
};
