//! Detects which categories an edit touched and stamps operator entries.

use crate::fields::AGGREGATE_FIELDS;
use clqc_core::category::{ChangeCategory, ChangeSet};
use clqc_core::missing::SameValue;
use clqc_core::observation::{DailyDataMethods, DailyObservation};
use clqc_core::period::PeriodAggregate;
use clqc_core::provenance::FieldProvenance;

/// Accessor for one provenance entry of [`DailyDataMethods`].
pub type DailySlot = fn(&mut DailyDataMethods) -> &mut FieldProvenance;

/// An editable field of a [`DailyObservation`].
///
/// Fields without a category (pressure) are persisted but never cascade.
pub struct DailyField {
    pub name: &'static str,
    pub category: Option<ChangeCategory>,
    pub provenance: Option<DailySlot>,
    same: fn(&DailyObservation, &DailyObservation) -> bool,
}

impl DailyField {
    pub fn changed(&self, previous: &DailyObservation, edited: &DailyObservation) -> bool {
        !(self.same)(previous, edited)
    }
}

macro_rules! daily_field {
    (@same $field:ident) => {{
        fn same(a: &DailyObservation, b: &DailyObservation) -> bool {
            a.$field.same_value(&b.$field)
        }
        same as fn(&DailyObservation, &DailyObservation) -> bool
    }};
    ($field:ident, $cat:ident, qc: $qc:ident) => {
        DailyField {
            name: stringify!($field),
            category: Some(ChangeCategory::$cat),
            provenance: Some({
                fn slot(m: &mut DailyDataMethods) -> &mut FieldProvenance {
                    &mut m.$qc
                }
                slot as DailySlot
            }),
            same: daily_field!(@same $field),
        }
    };
    ($field:ident, $cat:ident) => {
        DailyField {
            name: stringify!($field),
            category: Some(ChangeCategory::$cat),
            provenance: None,
            same: daily_field!(@same $field),
        }
    };
    ($field:ident) => {
        DailyField {
            name: stringify!($field),
            category: None,
            provenance: None,
            same: daily_field!(@same $field),
        }
    };
}

/// Every editable daily field with its category and provenance entry.
pub static DAILY_FIELDS: &[DailyField] = &[
    daily_field!(max_temp, MaxTemp, qc: max_temp),
    daily_field!(min_temp, MinTemp, qc: min_temp),
    daily_field!(max_rel_humid, RelHumidity),
    daily_field!(min_rel_humid, RelHumidity),
    daily_field!(max_wind, Wind, qc: max_wind),
    daily_field!(avg_wind_speed, Wind, qc: avg_wind),
    daily_field!(result_wind, Wind),
    daily_field!(max_gust, Gust, qc: max_gust),
    daily_field!(precip, Precip, qc: precip),
    daily_field!(snow_day, Snow, qc: snow),
    daily_field!(snow_ground, Depth, qc: depth),
    daily_field!(minutes_sun, Sun, qc: min_sun),
    daily_field!(percent_poss_sun, Sun, qc: poss_sun),
    daily_field!(sky_cover, Sky, qc: sky_cover),
    daily_field!(weather, Weather, qc: weather),
    daily_field!(max_slp),
    daily_field!(min_slp),
];

/// Names of the daily fields whose stored value differs.
pub fn changed_daily_fields(
    previous: &DailyObservation,
    edited: &DailyObservation,
) -> Vec<&'static str> {
    DAILY_FIELDS
        .iter()
        .filter(|f| f.changed(previous, edited))
        .map(|f| f.name)
        .collect()
}

/// Categories touched by editing `previous` into `edited`.
///
/// Sentinel-aware: two missing values are equal, floats compare within
/// epsilon. An unchanged observation yields the empty set.
///
/// ```rust
/// use chrono::NaiveDate;
/// use clqc_core::category::ChangeCategory;
/// use clqc_core::observation::DailyObservation;
/// use clqc_recon::tracker::diff;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let previous = DailyObservation::missing("KSEA", date);
/// let mut edited = previous.clone();
/// edited.min_temp = 28;
/// let changed: Vec<_> = diff(&previous, &edited).into_iter().collect();
/// assert_eq!(changed, vec![ChangeCategory::MinTemp]);
/// ```
pub fn diff(previous: &DailyObservation, edited: &DailyObservation) -> ChangeSet {
    DAILY_FIELDS
        .iter()
        .filter(|f| f.changed(previous, edited))
        .filter_map(|f| f.category)
        .collect()
}

/// A copy of `edited` whose changed governed fields are marked as
/// operator entries.
pub fn stamp_manual_entries(
    previous: &DailyObservation,
    edited: &DailyObservation,
) -> DailyObservation {
    let mut stamped = edited.clone();
    for field in DAILY_FIELDS.iter().filter(|f| f.changed(previous, edited)) {
        if let Some(slot) = field.provenance {
            *slot(&mut stamped.methods) = FieldProvenance::ManualEntry;
        }
    }
    stamped
}

/// Recompute the derived phenomena count and degree days.
pub fn derive_daily_fields(observation: &mut DailyObservation) {
    observation.refresh_derived();
}

/// Categories touched by editing a period aggregate directly.
pub fn diff_period(previous: &PeriodAggregate, edited: &PeriodAggregate) -> ChangeSet {
    AGGREGATE_FIELDS
        .iter()
        .filter(|f| !f.same_value(previous, edited))
        .flat_map(|f| f.categories.iter().copied())
        .collect()
}

/// Names of the aggregate fields whose stored value differs.
pub fn changed_period_fields(
    previous: &PeriodAggregate,
    edited: &PeriodAggregate,
) -> Vec<&'static str> {
    AGGREGATE_FIELDS
        .iter()
        .filter(|f| !f.same_value(previous, edited))
        .map(|f| f.name)
        .collect()
}

/// A copy of `edited` whose changed governed aggregate fields are marked
/// as operator entries.
pub fn stamp_period_manual_entries(
    previous: &PeriodAggregate,
    edited: &PeriodAggregate,
) -> PeriodAggregate {
    let mut stamped = edited.clone();
    for field in AGGREGATE_FIELDS.iter().filter(|f| !f.same_value(previous, edited)) {
        if let Some(slot) = field.provenance {
            *slot(&mut stamped.methods) = FieldProvenance::ManualEntry;
        }
    }
    stamped
}
