//! Timing of the daily jobs

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Time from `now` until the next `hour:00` UTC; a run due right now waits a day
pub fn until_next_daily_run(now: DateTime<Utc>, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now { today } else { today + Duration::days(1) };
    next - now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_later_today() {
        assert_eq!(until_next_daily_run(at(1, 30), 3), Duration::minutes(90));
    }

    #[test]
    fn test_already_passed_runs_tomorrow() {
        assert_eq!(until_next_daily_run(at(4, 0), 3), Duration::hours(23));
        assert_eq!(until_next_daily_run(at(3, 0), 3), Duration::hours(24));
    }

    #[test]
    fn test_hour_is_clamped() {
        assert_eq!(until_next_daily_run(at(22, 0), 99), Duration::hours(1));
    }
}
