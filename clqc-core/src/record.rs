//! Historical extremes for a station, by calendar day and by period.

use crate::category::ChangeCategory;
use crate::missing::{is_trace, Sentinel, MISSING, MISSING_PRECIP, MISSING_SNOW};
use crate::period::PeriodType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of occurrence years kept per record value.
pub const MAX_RECORD_YEARS: usize = 3;

/// Stand-in magnitude for a trace amount when ranking precipitation or
/// snowfall: above zero, below the smallest measurable amount.
const TRACE_RANK: f64 = 0.001;

/// Which historical extreme a value is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExtremeKind {
    MaxTemp,
    MinTemp,
    Precip,
    Snow,
}

impl ExtremeKind {
    pub const ALL: [ExtremeKind; 4] = [
        ExtremeKind::MaxTemp,
        ExtremeKind::MinTemp,
        ExtremeKind::Precip,
        ExtremeKind::Snow,
    ];

    /// Whether a larger value is more extreme.
    pub fn is_max(&self) -> bool {
        !matches!(self, ExtremeKind::MinTemp)
    }

    /// The daily field category whose edits can affect this extreme.
    pub fn category(&self) -> ChangeCategory {
        match self {
            ExtremeKind::MaxTemp => ChangeCategory::MaxTemp,
            ExtremeKind::MinTemp => ChangeCategory::MinTemp,
            ExtremeKind::Precip => ChangeCategory::Precip,
            ExtremeKind::Snow => ChangeCategory::Snow,
        }
    }

    /// Precipitation and snowfall use amount rules (zero never counts,
    /// trace ranks just above zero).
    pub fn is_amount(&self) -> bool {
        matches!(self, ExtremeKind::Precip | ExtremeKind::Snow)
    }
}

impl fmt::Display for ExtremeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremeKind::MaxTemp => write!(f, "maximum temperature"),
            ExtremeKind::MinTemp => write!(f, "minimum temperature"),
            ExtremeKind::Precip => write!(f, "precipitation"),
            ExtremeKind::Snow => write!(f, "snowfall"),
        }
    }
}

/// The four values of an observation or period that can set records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremeValues {
    pub max_temp: i32,
    pub min_temp: i32,
    pub precip: f32,
    pub snow: f32,
}

impl ExtremeValues {
    /// The value for `kind` widened to `f64`, or `None` if missing.
    pub fn value(&self, kind: ExtremeKind) -> Option<f64> {
        match kind {
            ExtremeKind::MaxTemp => present_int(self.max_temp),
            ExtremeKind::MinTemp => present_int(self.min_temp),
            ExtremeKind::Precip => present_amount(self.precip),
            ExtremeKind::Snow => present_amount(self.snow),
        }
    }
}

/// Record values with the years in which each occurred. Calendar-day and
/// period records follow the same update rules.
pub trait RecordValues {
    /// The raw record values, sentinels included.
    fn values(&self) -> ExtremeValues;

    fn years(&self, kind: ExtremeKind) -> &[i32];

    fn years_mut(&mut self, kind: ExtremeKind) -> &mut Vec<i32>;

    /// Overwrite the record value for `kind` with the one in `values`.
    fn set_value(&mut self, kind: ExtremeKind, values: &ExtremeValues);

    /// Stored record value for `kind`, or `None` if missing.
    fn value(&self, kind: ExtremeKind) -> Option<f64> {
        self.values().value(kind)
    }

    /// Fold one year's extremes into the record.
    ///
    /// A strictly more extreme value replaces the record and resets its
    /// years; an equal value adds the year if it is not already listed.
    /// Missing values on either side are skipped, as are zero amounts.
    /// Returns the extremes that were modified.
    fn apply(&mut self, year: i32, extremes: &ExtremeValues) -> Vec<ExtremeKind> {
        let mut updated = Vec::new();
        for kind in ExtremeKind::ALL {
            let (Some(new), Some(current)) = (extremes.value(kind), self.value(kind)) else {
                continue;
            };
            if kind.is_amount() && new == 0.0 {
                continue;
            }
            let (new_rank, current_rank) = if kind.is_amount() {
                (amount_rank(new), amount_rank(current))
            } else {
                (new, current)
            };
            let better = if kind.is_max() {
                new_rank > current_rank
            } else {
                new_rank < current_rank
            };
            if better {
                self.set_value(kind, extremes);
                let years = self.years_mut(kind);
                years.clear();
                years.push(year);
                updated.push(kind);
            } else if new_rank == current_rank {
                let years = self.years_mut(kind);
                if !years.contains(&year) {
                    years.push(year);
                    if years.len() > MAX_RECORD_YEARS {
                        years.remove(0);
                    }
                    updated.push(kind);
                }
            }
        }
        updated
    }
}

macro_rules! record_values {
    ($record:ty) => {
        impl RecordValues for $record {
            fn values(&self) -> ExtremeValues {
                ExtremeValues {
                    max_temp: self.max_temp,
                    min_temp: self.min_temp,
                    precip: self.precip,
                    snow: self.snow,
                }
            }

            fn years(&self, kind: ExtremeKind) -> &[i32] {
                match kind {
                    ExtremeKind::MaxTemp => &self.max_temp_years,
                    ExtremeKind::MinTemp => &self.min_temp_years,
                    ExtremeKind::Precip => &self.precip_years,
                    ExtremeKind::Snow => &self.snow_years,
                }
            }

            fn years_mut(&mut self, kind: ExtremeKind) -> &mut Vec<i32> {
                match kind {
                    ExtremeKind::MaxTemp => &mut self.max_temp_years,
                    ExtremeKind::MinTemp => &mut self.min_temp_years,
                    ExtremeKind::Precip => &mut self.precip_years,
                    ExtremeKind::Snow => &mut self.snow_years,
                }
            }

            fn set_value(&mut self, kind: ExtremeKind, values: &ExtremeValues) {
                match kind {
                    ExtremeKind::MaxTemp => self.max_temp = values.max_temp,
                    ExtremeKind::MinTemp => self.min_temp = values.min_temp,
                    ExtremeKind::Precip => self.precip = values.precip,
                    ExtremeKind::Snow => self.snow = values.snow,
                }
            }
        }
    };
}

/// Record values for one station and calendar day, each with up to
/// [`MAX_RECORD_YEARS`] years in which it occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeRecord {
    pub station_id: String,
    pub month: u32,
    pub day: u32,
    pub max_temp: i32,
    pub max_temp_years: Vec<i32>,
    pub min_temp: i32,
    pub min_temp_years: Vec<i32>,
    pub precip: f32,
    pub precip_years: Vec<i32>,
    pub snow: f32,
    pub snow_years: Vec<i32>,
}

impl ExtremeRecord {
    pub fn missing(station_id: &str, month: u32, day: u32) -> Self {
        ExtremeRecord {
            station_id: station_id.to_string(),
            month,
            day,
            max_temp: MISSING,
            max_temp_years: Vec::new(),
            min_temp: MISSING,
            min_temp_years: Vec::new(),
            precip: MISSING_PRECIP,
            precip_years: Vec::new(),
            snow: MISSING_SNOW,
            snow_years: Vec::new(),
        }
    }
}

record_values!(ExtremeRecord);

/// Record extremes for one station and period type, keyed by the month the
/// period ends in (December for annual periods). Temperatures are the
/// period's highest and lowest; precipitation and snowfall are totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub station_id: String,
    pub period_type: PeriodType,
    pub month: u32,
    pub max_temp: i32,
    pub max_temp_years: Vec<i32>,
    pub min_temp: i32,
    pub min_temp_years: Vec<i32>,
    pub precip: f32,
    pub precip_years: Vec<i32>,
    pub snow: f32,
    pub snow_years: Vec<i32>,
}

impl PeriodRecord {
    pub fn missing(station_id: &str, period_type: PeriodType, month: u32) -> Self {
        PeriodRecord {
            station_id: station_id.to_string(),
            period_type,
            month,
            max_temp: MISSING,
            max_temp_years: Vec::new(),
            min_temp: MISSING,
            min_temp_years: Vec::new(),
            precip: MISSING_PRECIP,
            precip_years: Vec::new(),
            snow: MISSING_SNOW,
            snow_years: Vec::new(),
        }
    }
}

record_values!(PeriodRecord);

/// Ranking magnitude of a precipitation/snow amount: trace sits between
/// zero and the smallest measurable amount.
pub fn amount_rank(value: f64) -> f64 {
    if is_trace(value as f32) {
        TRACE_RANK
    } else {
        value
    }
}

fn present_int(value: i32) -> Option<f64> {
    if value.is_missing() {
        None
    } else {
        Some(value as f64)
    }
}

fn present_amount(value: f32) -> Option<f64> {
    if value.is_missing() {
        None
    } else {
        Some(value as f64)
    }
}
