//! Wall-clock trigger schedules.
//! A schedule is a time of day, an optional day-of-month set and a recurrence.
//! `LastDayOfMonth` additionally requires that tomorrow is the 1st, so a
//! {28..31} day set fires exactly once per month, leap years included.
//!
//! No cron crate: the schedules here only need these two shapes.

use chorerank_core::config::TriggerConfig;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Days scanned for the next fire: one full leap cycle, so a day set like
/// `[29]` with `LastDayOfMonth` still finds the next leap February.
const SEARCH_DAYS: u32 = 4 * 366 + 6;

/// How a schedule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    /// Every day whose day-of-month is in the set (or every day if the set is empty).
    Daily,
    /// Only on the true last calendar day of the month.
    LastDayOfMonth,
}

/// When a trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSchedule {
    pub hour: u32,
    pub minute: u32,
    /// Allowed days of month; empty = any day.
    pub days: Vec<u32>,
    pub recurrence: Recurrence,
}

impl TriggerSchedule {
    pub fn daily(hour: u32, minute: u32) -> Self {
        Self {
            hour,
            minute,
            days: Vec::new(),
            recurrence: Recurrence::Daily,
        }
    }

    pub fn from_config(config: &TriggerConfig, recurrence: Recurrence) -> Self {
        Self {
            hour: config.hour,
            minute: config.minute,
            days: config.days.clone(),
            recurrence,
        }
    }

    /// Whether the schedule may fire on `date`.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        if !self.days.is_empty() && !self.days.contains(&date.day()) {
            return false;
        }
        match self.recurrence {
            Recurrence::Daily => true,
            Recurrence::LastDayOfMonth => is_last_day_of_month(date),
        }
    }

    /// First fire time strictly after `after`.
    pub fn next_fire(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut date = after.date();
        for _ in 0..SEARCH_DAYS {
            if self.matches_date(date) {
                let candidate = date.and_hms_opt(self.hour, self.minute, 0)?;
                if candidate > after {
                    return Some(candidate);
                }
            }
            date = date.succ_opt()?;
        }
        tracing::warn!(
            "Schedule {:02}:{:02} days={:?} never fires",
            self.hour,
            self.minute,
            self.days
        );
        None
    }
}

/// True when the next calendar day is the 1st of a month.
pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().is_some_and(|tomorrow| tomorrow.day() == 1)
}

/// Period label (`YYYY-MM`) of the month containing `date`.
pub fn period_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Time left until `target`, zero if already passed.
pub fn until(now: NaiveDateTime, target: NaiveDateTime) -> std::time::Duration {
    (target - now)
        .max(Duration::zero())
        .to_std()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn month_end() -> TriggerSchedule {
        TriggerSchedule {
            hour: 23,
            minute: 59,
            days: vec![28, 29, 30, 31],
            recurrence: Recurrence::LastDayOfMonth,
        }
    }

    #[test]
    fn test_last_day_of_month() {
        assert!(is_last_day_of_month(date(2026, 4, 30)));
        assert!(!is_last_day_of_month(date(2026, 4, 29)));
        assert!(is_last_day_of_month(date(2026, 12, 31)));
        assert!(is_last_day_of_month(date(2026, 2, 28)));
        assert!(!is_last_day_of_month(date(2028, 2, 28)));
        assert!(is_last_day_of_month(date(2028, 2, 29)));
    }

    #[test]
    fn test_daily_next_fire() {
        let s = TriggerSchedule::daily(8, 0);
        assert_eq!(s.next_fire(at(2026, 2, 22, 7, 0)), Some(at(2026, 2, 22, 8, 0)));
        // exactly at the fire time → next day
        assert_eq!(s.next_fire(at(2026, 2, 22, 8, 0)), Some(at(2026, 2, 23, 8, 0)));
        assert_eq!(s.next_fire(at(2026, 12, 31, 9, 0)), Some(at(2027, 1, 1, 8, 0)));
    }

    #[test]
    fn test_month_end_fires_apr_30_not_29() {
        let s = month_end();
        assert!(!s.matches_date(date(2026, 4, 29)));
        assert!(s.matches_date(date(2026, 4, 30)));
        assert_eq!(s.next_fire(at(2026, 4, 28, 12, 0)), Some(at(2026, 4, 30, 23, 59)));
    }

    #[test]
    fn test_month_end_february() {
        let s = month_end();
        // non-leap year: Feb 28 is the last day
        assert_eq!(s.next_fire(at(2026, 2, 1, 0, 0)), Some(at(2026, 2, 28, 23, 59)));
        // leap year: skips Feb 28, fires Feb 29
        assert!(!s.matches_date(date(2028, 2, 28)));
        assert_eq!(s.next_fire(at(2028, 2, 1, 0, 0)), Some(at(2028, 2, 29, 23, 59)));
    }

    #[test]
    fn test_month_end_rolls_to_next_month() {
        let s = month_end();
        assert_eq!(s.next_fire(at(2026, 4, 30, 23, 59)), Some(at(2026, 5, 31, 23, 59)));
        assert_eq!(s.next_fire(at(2026, 6, 30, 23, 59)), Some(at(2026, 7, 31, 23, 59)));
    }

    #[test]
    fn test_day_set_restricts_daily() {
        let s = TriggerSchedule {
            days: vec![1, 15],
            ..TriggerSchedule::daily(9, 30)
        };
        assert_eq!(s.next_fire(at(2026, 3, 2, 0, 0)), Some(at(2026, 3, 15, 9, 30)));
    }

    #[test]
    fn test_leap_day_only_close_waits_for_leap_year() {
        let s = TriggerSchedule {
            hour: 23,
            minute: 59,
            days: vec![29],
            recurrence: Recurrence::LastDayOfMonth,
        };
        assert_eq!(s.next_fire(at(2026, 3, 1, 0, 0)), Some(at(2028, 2, 29, 23, 59)));
        assert_eq!(s.next_fire(at(2028, 3, 1, 0, 0)), Some(at(2032, 2, 29, 23, 59)));
    }

    #[test]
    fn test_unsatisfiable_schedule() {
        let s = TriggerSchedule {
            hour: 12,
            minute: 0,
            days: vec![15],
            recurrence: Recurrence::LastDayOfMonth,
        };
        assert_eq!(s.next_fire(at(2026, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_period_label_and_until() {
        assert_eq!(period_label(date(2026, 4, 30)), "2026-04");
        let now = at(2026, 4, 30, 23, 58);
        assert_eq!(until(now, at(2026, 4, 30, 23, 59)).as_secs(), 60);
        assert_eq!(until(now, at(2026, 4, 30, 23, 0)).as_secs(), 0);
    }
}
