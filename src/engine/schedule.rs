//! When poll mode runs: at most once per bar interval, shortly after it opens.

use crate::config::settings::ScanSettings;
use crate::domain::SessionHours;
use crate::utils::time_utils::floor_to_interval;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSchedule {
    pub interval_ms: i64,
    /// Delay after the interval opens, so the previous bar is final at the source
    pub run_offset_ms: i64,
    pub session: Option<SessionHours>,
}

impl ScanSchedule {
    pub fn new(interval_ms: i64, run_offset_ms: i64, session: Option<SessionHours>) -> Self {
        // The offset has to leave room inside the interval for a poll tick
        let run_offset_ms = run_offset_ms.clamp(0, interval_ms / 2);
        Self {
            interval_ms,
            run_offset_ms,
            session,
        }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(
            settings.interval_ms,
            settings.schedule.run_offset_secs as i64 * 1000,
            settings.session.clone(),
        )
    }

    /// Open time of the interval to scan now, or `None` if nothing is due.
    pub fn due_bucket(&self, now_ms: i64, last_bucket: Option<i64>) -> Option<i64> {
        let bucket = floor_to_interval(now_ms, self.interval_ms);
        if now_ms - bucket < self.run_offset_ms {
            return None;
        }
        if last_bucket.is_some_and(|last| last >= bucket) {
            return None;
        }
        // Gate on the bar that just closed, so the last session bar is scanned at the close
        if let Some(session) = &self.session {
            if !session.contains(bucket - self.interval_ms) {
                return None;
            }
        }
        Some(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TimeUtils;
    use chrono::TimeZone;

    const H: i64 = TimeUtils::MS_IN_H;

    #[test]
    fn runs_once_per_interval_after_offset() {
        let schedule = ScanSchedule::new(H, 60_000, None);
        let bucket = 100 * H;

        assert_eq!(schedule.due_bucket(bucket + 30_000, None), None);
        assert_eq!(schedule.due_bucket(bucket + 60_000, None), Some(bucket));
        assert_eq!(schedule.due_bucket(bucket + 90_000, Some(bucket)), None);
        assert_eq!(schedule.due_bucket(bucket + H + 75_000, Some(bucket)), Some(bucket + H));
    }

    #[test]
    fn offset_is_clamped_for_short_intervals() {
        let schedule = ScanSchedule::new(TimeUtils::MS_IN_MIN, 60_000, None);
        assert_eq!(schedule.run_offset_ms, 30_000);
        assert_eq!(schedule.due_bucket(TimeUtils::MS_IN_MIN + 45_000, None), Some(TimeUtils::MS_IN_MIN));
    }

    #[test]
    fn respects_session_hours() {
        let schedule = ScanSchedule::new(H, 60_000, Some(SessionHours::us_equities()));
        let ny = chrono_tz::America::New_York;
        let open = ny.with_ymd_and_hms(2024, 3, 1, 10, 1, 30).unwrap().timestamp_millis();
        let night = ny.with_ymd_and_hms(2024, 3, 1, 20, 1, 30).unwrap().timestamp_millis();

        assert!(schedule.due_bucket(open, None).is_some());
        assert!(schedule.due_bucket(night, None).is_none());
    }

    #[test]
    fn last_session_bar_is_scanned_at_the_close() {
        let schedule = ScanSchedule::new(H, 60_000, Some(SessionHours::us_equities()));
        let ny = chrono_tz::America::New_York;
        let at = |h, m, s| ny.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap().timestamp_millis();

        // 16:01 closes the 15:00-16:00 bar
        let close_bucket = schedule.due_bucket(at(16, 1, 30), None).unwrap();
        assert_eq!(close_bucket, at(16, 0, 0));
        // 17:01 would scan the 16:00 bar, outside the session
        assert!(schedule.due_bucket(at(17, 1, 30), Some(close_bucket)).is_none());
        // 09:01 would scan the pre-market 08:00 bar
        assert!(schedule.due_bucket(at(9, 1, 30), None).is_none());
        assert!(schedule.due_bucket(at(10, 1, 30), None).is_some());
    }
}
