//! Trading-session hour filter.
//!
//! Equity bars outside regular trading hours are noise for the hourly
//! crossover scan, so bars can be restricted to `[start_hour, end_hour)` in
//! the exchange's local time zone.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionHours {
    /// IANA zone name, e.g. "America/New_York"
    pub timezone: Tz,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SessionHours {
    pub fn new(timezone: Tz, start_hour: u32, end_hour: u32) -> Self {
        Self {
            timezone,
            start_hour,
            end_hour,
        }
    }

    /// US equities regular session, hour granularity (09:00 - 16:00 New York).
    pub fn us_equities() -> Self {
        Self::new(chrono_tz::America::New_York, 9, 16)
    }

    pub fn local_hour(&self, epoch_ms: i64) -> Option<u32> {
        DateTime::<Utc>::from_timestamp_millis(epoch_ms)
            .map(|dt| dt.with_timezone(&self.timezone).hour())
    }

    pub fn contains(&self, epoch_ms: i64) -> bool {
        self.local_hour(epoch_ms)
            .is_some_and(|h| h >= self.start_hour && h < self.end_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filters_by_local_hour() {
        let session = SessionHours::us_equities();
        let ny = chrono_tz::America::New_York;

        let open = ny.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let last = ny.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let close = ny.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        let pre = ny.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        assert!(session.contains(open.timestamp_millis()));
        assert!(session.contains(last.timestamp_millis()));
        assert!(!session.contains(close.timestamp_millis()));
        assert!(!session.contains(pre.timestamp_millis()));
    }
}
