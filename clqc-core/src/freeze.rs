use crate::date_range::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// First and last freezing minimum (32 °F or below) of a freeze season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeDates {
    pub station_id: String,
    pub season: DateRange,
    pub early_freeze: Option<NaiveDate>,
    pub late_freeze: Option<NaiveDate>,
}
