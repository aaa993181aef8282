use chrono::{DateTime, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_3_MIN: i64 = Self::MS_IN_S * 60 * 3;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_S * 60 * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_S * 60 * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_S * 60 * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_2_H: i64 = Self::MS_IN_MIN * 60 * 2;
    pub const MS_IN_4_H: i64 = Self::MS_IN_MIN * 60 * 4;
    pub const MS_IN_6_H: i64 = Self::MS_IN_MIN * 60 * 6;
    pub const MS_IN_8_H: i64 = Self::MS_IN_MIN * 60 * 8;
    pub const MS_IN_12_H: i64 = Self::MS_IN_MIN * 60 * 12;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const MS_IN_3_D: i64 = Self::MS_IN_H * 24 * 3;
    pub const MS_IN_W: i64 = Self::MS_IN_D * 7;
    pub const MS_IN_1_M: i64 = Self::MS_IN_D * 30;
    pub const BAR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Convert interval in milliseconds to a Binance-style shorthand (e.g. `30m`, `1h`).
    pub fn interval_to_string(interval_ms: i64) -> &'static str {
        match interval_ms {
            Self::MS_IN_S => "1s",
            Self::MS_IN_MIN => "1m",
            Self::MS_IN_3_MIN => "3m",
            Self::MS_IN_5_MIN => "5m",
            Self::MS_IN_15_MIN => "15m",
            Self::MS_IN_30_MIN => "30m",
            Self::MS_IN_H => "1h",
            Self::MS_IN_2_H => "2h",
            Self::MS_IN_4_H => "4h",
            Self::MS_IN_6_H => "6h",
            Self::MS_IN_8_H => "8h",
            Self::MS_IN_12_H => "12h",
            Self::MS_IN_D => "1d",
            Self::MS_IN_3_D => "3d",
            Self::MS_IN_W => "1w",
            Self::MS_IN_1_M => "1M",
            _ => "unknown",
        }
    }

    /// Inverse of `interval_to_string`. Used for CLI / config parsing.
    pub fn interval_from_str(text: &str) -> Option<i64> {
        let ms = match text {
            "1s" => Self::MS_IN_S,
            "1m" => Self::MS_IN_MIN,
            "3m" => Self::MS_IN_3_MIN,
            "5m" => Self::MS_IN_5_MIN,
            "15m" => Self::MS_IN_15_MIN,
            "30m" => Self::MS_IN_30_MIN,
            "1h" => Self::MS_IN_H,
            "2h" => Self::MS_IN_2_H,
            "4h" => Self::MS_IN_4_H,
            "6h" => Self::MS_IN_6_H,
            "8h" => Self::MS_IN_8_H,
            "12h" => Self::MS_IN_12_H,
            "1d" => Self::MS_IN_D,
            "3d" => Self::MS_IN_3_D,
            "1w" => Self::MS_IN_W,
            "1M" => Self::MS_IN_1_M,
            _ => return None,
        };
        Some(ms)
    }
}

pub fn epoch_ms_to_datetime(epoch_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(epoch_ms)
}

pub fn bar_time_label(epoch_ms: i64) -> String {
    match epoch_ms_to_datetime(epoch_ms) {
        Some(dt) => dt.format(TimeUtils::BAR_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

pub fn now_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Open time of the interval bucket that contains `epoch_ms`.
pub fn floor_to_interval(epoch_ms: i64, interval_ms: i64) -> i64 {
    debug_assert!(interval_ms > 0);
    epoch_ms - epoch_ms.rem_euclid(interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_strings_round_trip_for_known_values() {
        for text in ["1m", "5m", "1h", "4h", "1d"] {
            let ms = TimeUtils::interval_from_str(text).unwrap();
            assert_eq!(TimeUtils::interval_to_string(ms), text);
        }
        assert_eq!(TimeUtils::interval_from_str("7m"), None);
    }

    #[test]
    fn floor_to_interval_snaps_to_bucket_start() {
        let hour = TimeUtils::MS_IN_H;
        assert_eq!(floor_to_interval(hour * 5 + 1234, hour), hour * 5);
        assert_eq!(floor_to_interval(hour * 5, hour), hour * 5);
    }

    #[test]
    fn bar_time_label_formats_utc() {
        assert_eq!(bar_time_label(0), "1970-01-01 00:00");
        assert_eq!(bar_time_label(TimeUtils::MS_IN_D + TimeUtils::MS_IN_H), "1970-01-02 01:00");
    }
}
