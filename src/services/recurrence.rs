//! Occurrence dates of recurring events
//!
//! Occurrence `k` of a series starts `k` steps after the parent's original
//! start: `k` days, `7k` days or `k` calendar months. Monthly steps are always
//! taken from the original start, so a series on the 31st lands on the last
//! day of shorter months and returns to the 31st afterwards.

use chrono::{DateTime, Datelike, Duration, Months, Utc};

use crate::models::{Event, Recurrence};

/// Upper bound on occurrences produced by one call
const MAX_OCCURRENCES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub recurrence: Recurrence,
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Schedule {
    /// Schedule of a recurring parent event, `None` for one-off events
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.recurrence == Recurrence::None || event.parent_event_id.is_some() {
            return None;
        }
        Some(Self {
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            recurrence: event.recurrence,
            until: event.recurrence_until?,
        })
    }

    /// Start of occurrence `k`; `k = 0` is the parent itself
    pub fn nth_start(&self, k: u32) -> Option<DateTime<Utc>> {
        match self.recurrence {
            Recurrence::None => (k == 0).then_some(self.starts_at),
            Recurrence::Daily => self.starts_at.checked_add_signed(Duration::days(i64::from(k))),
            Recurrence::Weekly => self.starts_at.checked_add_signed(Duration::days(7 * i64::from(k))),
            Recurrence::Monthly => self.starts_at.checked_add_months(Months::new(k)),
        }
    }

    /// First step worth evaluating for a window opening at `after`
    fn first_step(&self, after: DateTime<Utc>) -> u32 {
        if after <= self.starts_at {
            return 1;
        }
        let skipped = match self.recurrence {
            Recurrence::None => 0,
            Recurrence::Daily => (after - self.starts_at).num_days(),
            Recurrence::Weekly => (after - self.starts_at).num_days() / 7,
            Recurrence::Monthly => {
                let months = i64::from(after.year() - self.starts_at.year()) * 12
                    + i64::from(after.month()) - i64::from(self.starts_at.month());
                months - 1
            }
        };
        u32::try_from(skipped.max(1)).unwrap_or(u32::MAX)
    }

    /// Occurrences starting in `(after, horizon]` and not after `until`
    pub fn occurrences_between(&self, after: DateTime<Utc>, horizon: DateTime<Utc>) -> Vec<Occurrence> {
        let mut out = Vec::new();
        if self.recurrence == Recurrence::None {
            return out;
        }

        let limit = horizon.min(self.until);
        let duration = self.ends_at - self.starts_at;
        let mut k = self.first_step(after);

        while out.len() < MAX_OCCURRENCES {
            let Some(starts_at) = self.nth_start(k) else {
                break;
            };
            if starts_at > limit {
                break;
            }
            if starts_at > after {
                out.push(Occurrence {
                    starts_at,
                    ends_at: starts_at + duration,
                });
            }
            k = match k.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn schedule(recurrence: Recurrence, start: DateTime<Utc>, until: DateTime<Utc>) -> Schedule {
        Schedule {
            starts_at: start,
            ends_at: start + Duration::hours(2),
            recurrence,
            until,
        }
    }

    #[test]
    fn test_weekly_occurrences() {
        let s = schedule(Recurrence::Weekly, at(2024, 1, 1, 10), at(2024, 2, 1, 0));
        let got: Vec<_> = s
            .occurrences_between(at(2023, 12, 1, 0), at(2025, 1, 1, 0))
            .into_iter()
            .map(|o| o.starts_at)
            .collect();
        assert_eq!(
            got,
            vec![at(2024, 1, 8, 10), at(2024, 1, 15, 10), at(2024, 1, 22, 10), at(2024, 1, 29, 10)]
        );
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let s = schedule(Recurrence::Monthly, at(2024, 1, 31, 9), at(2024, 6, 1, 0));
        let got: Vec<_> = s
            .occurrences_between(at(2024, 1, 1, 0), at(2025, 1, 1, 0))
            .into_iter()
            .map(|o| o.starts_at)
            .collect();
        assert_eq!(
            got,
            vec![at(2024, 2, 29, 9), at(2024, 3, 31, 9), at(2024, 4, 30, 9), at(2024, 5, 31, 9)]
        );
    }

    #[test]
    fn test_window_excludes_past_and_far_future() {
        let s = schedule(Recurrence::Daily, at(2024, 1, 1, 8), at(2024, 12, 31, 0));
        let got = s.occurrences_between(at(2024, 3, 10, 12), at(2024, 3, 13, 12));
        let starts: Vec<_> = got.iter().map(|o| o.starts_at).collect();
        assert_eq!(starts, vec![at(2024, 3, 11, 8), at(2024, 3, 12, 8), at(2024, 3, 13, 8)]);
        assert!(got.iter().all(|o| o.ends_at - o.starts_at == Duration::hours(2)));
    }

    #[test]
    fn test_monthly_window_late_in_series() {
        let s = schedule(Recurrence::Monthly, at(2023, 1, 15, 9), at(2030, 1, 1, 0));
        let got: Vec<_> = s
            .occurrences_between(at(2024, 5, 20, 0), at(2024, 8, 1, 0))
            .into_iter()
            .map(|o| o.starts_at)
            .collect();
        assert_eq!(got, vec![at(2024, 6, 15, 9), at(2024, 7, 15, 9)]);
    }

    #[test]
    fn test_one_off_event_has_no_occurrences() {
        let s = schedule(Recurrence::None, at(2024, 1, 1, 8), at(2024, 12, 31, 0));
        assert!(s.occurrences_between(at(2023, 1, 1, 0), at(2025, 1, 1, 0)).is_empty());
        assert_eq!(s.nth_start(0), Some(at(2024, 1, 1, 8)));
        assert_eq!(s.nth_start(1), None);
    }

    #[test]
    fn test_until_before_window_yields_nothing() {
        let s = schedule(Recurrence::Daily, at(2024, 1, 1, 8), at(2024, 1, 5, 0));
        assert!(s.occurrences_between(at(2024, 2, 1, 0), at(2024, 3, 1, 0)).is_empty());
    }

    fn recurrence_strategy() -> impl Strategy<Value = Recurrence> {
        prop_oneof![
            Just(Recurrence::Daily),
            Just(Recurrence::Weekly),
            Just(Recurrence::Monthly),
        ]
    }

    proptest! {
        #[test]
        fn prop_occurrences_respect_window(
            recurrence in recurrence_strategy(),
            start_offset_hours in 0i64..(24 * 400),
            duration_minutes in 15i64..(60 * 24),
            until_days in 1i64..400,
            window_offset_days in -30i64..400,
            horizon_days in 1i64..120,
        ) {
            let base = at(2024, 1, 1, 0);
            let starts_at = base + Duration::hours(start_offset_hours);
            let s = Schedule {
                starts_at,
                ends_at: starts_at + Duration::minutes(duration_minutes),
                recurrence,
                until: starts_at + Duration::days(until_days),
            };
            let after = base + Duration::days(window_offset_days);
            let horizon = after + Duration::days(horizon_days);

            let got = s.occurrences_between(after, horizon);

            for o in &got {
                prop_assert!(o.starts_at > after);
                prop_assert!(o.starts_at > s.starts_at);
                prop_assert!(o.starts_at <= horizon);
                prop_assert!(o.starts_at <= s.until);
                prop_assert_eq!(o.ends_at - o.starts_at, Duration::minutes(duration_minutes));
            }
            for pair in got.windows(2) {
                prop_assert!(pair[0].starts_at < pair[1].starts_at);
            }
        }

        #[test]
        fn prop_daily_count_matches_day_span(
            start_offset_hours in 0i64..(24 * 30),
            until_days in 1i64..200,
        ) {
            let starts_at = at(2024, 1, 1, 0) + Duration::hours(start_offset_hours);
            let s = Schedule {
                starts_at,
                ends_at: starts_at + Duration::hours(1),
                recurrence: Recurrence::Daily,
                until: starts_at + Duration::days(until_days),
            };
            let got = s.occurrences_between(starts_at - Duration::days(1), starts_at + Duration::days(1000));
            prop_assert_eq!(got.len() as i64, until_days);
        }

        #[test]
        fn prop_monthly_keeps_day_or_clamps(
            day in 1u32..=31,
            months in 1u32..24,
        ) {
            let start = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
            let s = schedule(Recurrence::Monthly, start, start + Duration::days(800));
            let nth = s.nth_start(months).unwrap();
            prop_assert!(nth.day() <= day);
            if nth.day() < day {
                // clamped: the next day belongs to the following month
                prop_assert_eq!((nth + Duration::days(1)).day(), 1);
            }
        }
    }
}
