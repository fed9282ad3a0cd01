//! Shared utility functions for climate QC crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format a NaiveDate as "YYYYMMDD" (compact fixture format)
    pub fn format_date_compact(date: &NaiveDate) -> String {
        date.format("%Y%m%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse a date string in "YYYYMMDD" format
    pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y%m%d")?)
    }

    /// Parse either "YYYY-MM-DD" or "YYYYMMDD".
    pub fn parse_date_any(s: &str) -> anyhow::Result<NaiveDate> {
        let s = s.trim();
        if s.contains('-') {
            parse_date(s)
        } else {
            parse_date_compact(s)
        }
    }

    /// Last calendar day of the given month.
    pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
    }

    /// First and last day of the month containing `date`.
    pub fn month_bounds(date: &NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
        let end = last_day_of_month(date.year(), date.month())?;
        Some((start, end))
    }

    /// First and last day of the meteorological season containing `date`.
    ///
    /// Seasons are DJF, MAM, JJA and SON. December belongs to the winter
    /// that ends in February of the following year, so 2024-12-10 falls in
    /// 2024-12-01..=2025-02-28.
    pub fn season_bounds(date: &NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let year = date.year();
        let (start_year, start_month) = match date.month() {
            12 => (year, 12),
            1 | 2 => (year - 1, 12),
            m => (year, ((m - 3) / 3) * 3 + 3),
        };
        let start = NaiveDate::from_ymd_opt(start_year, start_month, 1)?;
        let (end_year, end_month) = if start_month == 12 {
            (start_year + 1, 2)
        } else {
            (start_year, start_month + 2)
        };
        let end = last_day_of_month(end_year, end_month)?;
        Some((start, end))
    }

    /// First and last day of the calendar year containing `date`.
    pub fn year_bounds(date: &NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(date.year(), 1, 1)?;
        let end = NaiveDate::from_ymd_opt(date.year(), 12, 31)?;
        Some((start, end))
    }

    /// Get the freeze season for a given date.
    /// Freeze season runs Jul 1 to Jun 30.
    /// e.g., Jul 1 2023 -> 2023-07-01..=2024-06-30, Mar 3 2024 -> same season
    pub fn freeze_season_bounds(date: &NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start_year = if date.month() >= 7 {
            date.year()
        } else {
            date.year() - 1
        };
        let start = NaiveDate::from_ymd_opt(start_year, 7, 1)?;
        let end = NaiveDate::from_ymd_opt(start_year + 1, 6, 30)?;
        Some((start, end))
    }

}
