use chrono::{NaiveDate, TimeDelta};
use clqc_utils::dates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::replace;

/// An inclusive date range that also iterates each date from the start
/// date through the end date.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Hash, Serialize, Deserialize)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    pub fn start(&self) -> NaiveDate {
        self.0
    }

    pub fn end(&self) -> NaiveDate {
        self.1
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0 <= *date && *date <= self.1
    }

    /// Number of days in the range, zero when empty.
    pub fn num_days(&self) -> i64 {
        ((self.1 - self.0).num_days() + 1).max(0)
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: &NaiveDate) -> Option<DateRange> {
        dates::month_bounds(date).map(|(s, e)| DateRange(s, e))
    }

    /// The meteorological season (DJF, MAM, JJA, SON) containing `date`.
    pub fn season_of(date: &NaiveDate) -> Option<DateRange> {
        dates::season_bounds(date).map(|(s, e)| DateRange(s, e))
    }

    /// The calendar year containing `date`.
    pub fn year_of(date: &NaiveDate) -> Option<DateRange> {
        dates::year_bounds(date).map(|(s, e)| DateRange(s, e))
    }

    /// The Jul 1 – Jun 30 freeze season containing `date`.
    pub fn freeze_season_of(date: &NaiveDate) -> Option<DateRange> {
        dates::freeze_season_bounds(date).map(|(s, e)| DateRange(s, e))
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", dates::format_date(&self.0), dates::format_date(&self.1))
    }
}

#[cfg(test)]
mod tests {
    use super::DateRange;
    use chrono::NaiveDate;

    #[test]
    fn test_date_range_iteration() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
        let range = DateRange(start, end);
        assert_eq!(range.num_days(), 5);
        let dates: Vec<NaiveDate> = range.collect();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], start);
        assert_eq!(dates[4], end);
    }

    #[test]
    fn test_date_range_empty() {
        let start = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
        let range = DateRange(start, end);
        assert_eq!(range.num_days(), 0);
        assert!(!range.contains(&start));
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_period_ranges_for_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let month = DateRange::month_of(&date).unwrap();
        assert_eq!(month.to_string(), "2024-01-01..2024-01-31");
        let season = DateRange::season_of(&date).unwrap();
        assert_eq!(season.to_string(), "2023-12-01..2024-02-29");
        let year = DateRange::year_of(&date).unwrap();
        assert!(year.contains(&date));
        assert_eq!(year.num_days(), 366);
        let freeze = DateRange::freeze_season_of(&date).unwrap();
        assert_eq!(freeze.to_string(), "2023-07-01..2024-06-30");
    }
}
