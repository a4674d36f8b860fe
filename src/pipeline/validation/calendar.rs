//! Business-day calendar for trade-date checks.
//!
//! The default calendar is deliberately minimal: three fixed-date US holidays,
//! no observed-day shifting, no floating holidays, no year bounds. It is not an
//! exchange calendar. Deployments that care should build their own with
//! `HolidayCalendar::empty()` and the `with_*` builders.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A holiday recurring on the same month/day every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    #[serde(default)]
    recurring: Vec<MonthDay>,
    #[serde(default)]
    dates: Vec<NaiveDate>,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::minimal_us()
    }
}

impl HolidayCalendar {
    pub fn empty() -> Self {
        Self {
            recurring: Vec::new(),
            dates: Vec::new(),
        }
    }

    /// New Year's Day, Independence Day, Christmas Day.
    pub fn minimal_us() -> Self {
        Self::empty()
            .with_recurring(1, 1)
            .with_recurring(7, 4)
            .with_recurring(12, 25)
    }

    pub fn with_recurring(mut self, month: u32, day: u32) -> Self {
        self.recurring.push(MonthDay { month, day });
        self
    }

    /// A one-off closure, e.g. an observed holiday or a market disruption.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.dates.push(date);
        self
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.recurring
            .iter()
            .any(|md| md.month == date.month() && md.day == date.day())
            || self.dates.contains(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn weekends_are_not_business_days() {
        let cal = HolidayCalendar::empty();
        assert!(!cal.is_business_day(date("2023-01-07"))); // Saturday
        assert!(!cal.is_business_day(date("2023-01-08"))); // Sunday
        assert!(cal.is_business_day(date("2023-01-09")));
    }

    #[test]
    fn minimal_set_covers_three_fixed_holidays() {
        let cal = HolidayCalendar::minimal_us();
        assert!(cal.is_holiday(date("2024-01-01")));
        assert!(cal.is_holiday(date("2023-07-04")));
        assert!(cal.is_holiday(date("2023-12-25")));
        // Thanksgiving is a floating holiday and intentionally absent
        assert!(!cal.is_holiday(date("2023-11-23")));
    }

    #[test]
    fn one_off_dates() {
        let cal = HolidayCalendar::empty().with_date(date("2023-07-05"));
        assert!(!cal.is_business_day(date("2023-07-05")));
        assert!(cal.is_business_day(date("2024-07-05")));
    }

    #[test]
    fn calendar_from_json() {
        let cal: HolidayCalendar =
            serde_json::from_str(r#"{"recurring": [{"month": 11, "day": 11}], "dates": ["2023-04-07"]}"#).unwrap();
        assert!(cal.is_holiday(date("2023-11-11")));
        assert!(cal.is_holiday(date("2023-04-07")));
        assert!(!cal.is_holiday(date("2023-12-25")));
    }
}
