//! Which aggregate fields each change category feeds, and how a rebuilt
//! aggregate is merged into a stored one.

use clqc_core::category::{ChangeCategory, ChangeSet};
use clqc_core::missing::SameValue;
use clqc_core::period::{PeriodAggregate, PeriodDataMethods};
use clqc_core::provenance::FieldProvenance;
use serde::Serialize;

/// Accessor for one provenance entry of [`PeriodDataMethods`].
pub type ProvenanceSlot = fn(&mut PeriodDataMethods) -> &mut FieldProvenance;

/// One mergeable unit of a [`PeriodAggregate`]: a value (plus its date list
/// where it has one), the categories that feed it, and its provenance entry
/// if the field is governed.
pub struct AggregateField {
    pub name: &'static str,
    pub categories: &'static [ChangeCategory],
    pub provenance: Option<ProvenanceSlot>,
    copy: fn(&mut PeriodAggregate, &PeriodAggregate),
    same: fn(&PeriodAggregate, &PeriodAggregate) -> bool,
}

impl AggregateField {
    pub fn is_governed(&self) -> bool {
        self.provenance.is_some()
    }

    pub fn affected_by(&self, changed: &ChangeSet) -> bool {
        self.categories.iter().any(|c| changed.contains(c))
    }

    /// Provenance of this field in `aggregate`; `None` if ungoverned.
    pub fn provenance_in(&self, aggregate: &PeriodAggregate) -> Option<FieldProvenance> {
        self.provenance.map(|slot| {
            let mut methods = aggregate.methods;
            *slot(&mut methods)
        })
    }

    pub fn copy_value(&self, dst: &mut PeriodAggregate, src: &PeriodAggregate) {
        (self.copy)(dst, src)
    }

    pub fn same_value(&self, a: &PeriodAggregate, b: &PeriodAggregate) -> bool {
        (self.same)(a, b)
    }
}

macro_rules! aggregate_field {
    (@copy $($field:ident),+) => {{
        fn copy(dst: &mut PeriodAggregate, src: &PeriodAggregate) {
            $(dst.$field = src.$field.clone();)+
        }
        copy as fn(&mut PeriodAggregate, &PeriodAggregate)
    }};
    (@same $($field:ident),+) => {{
        fn same(a: &PeriodAggregate, b: &PeriodAggregate) -> bool {
            true $(&& a.$field.same_value(&b.$field))+
        }
        same as fn(&PeriodAggregate, &PeriodAggregate) -> bool
    }};
    ($name:literal, [$($cat:ident),+], qc: $qc:ident, fields: [$($field:ident),+]) => {
        AggregateField {
            name: $name,
            categories: &[$(ChangeCategory::$cat),+],
            provenance: Some({
                fn slot(m: &mut PeriodDataMethods) -> &mut FieldProvenance {
                    &mut m.$qc
                }
                slot as ProvenanceSlot
            }),
            copy: aggregate_field!(@copy $($field),+),
            same: aggregate_field!(@same $($field),+),
        }
    };
    ($name:literal, [$($cat:ident),+], fields: [$($field:ident),+]) => {
        AggregateField {
            name: $name,
            categories: &[$(ChangeCategory::$cat),+],
            provenance: None,
            copy: aggregate_field!(@copy $($field),+),
            same: aggregate_field!(@same $($field),+),
        }
    };
}

/// Every mergeable aggregate field, in display order.
pub static AGGREGATE_FIELDS: &[AggregateField] = &[
    aggregate_field!("max_temp", [MaxTemp], qc: max_temp, fields: [max_temp, max_temp_dates]),
    aggregate_field!("max_temp_mean", [MaxTemp], qc: avg_max_temp, fields: [max_temp_mean]),
    aggregate_field!("num_max_ge_90", [MaxTemp], qc: max_temp_ge_90, fields: [num_max_ge_90]),
    aggregate_field!("num_max_le_32", [MaxTemp], qc: max_temp_le_32, fields: [num_max_le_32]),
    aggregate_field!("num_max_ge_t1", [MaxTemp], fields: [num_max_ge_t1]),
    aggregate_field!("num_max_ge_t2", [MaxTemp], fields: [num_max_ge_t2]),
    aggregate_field!("num_max_le_t3", [MaxTemp], fields: [num_max_le_t3]),
    aggregate_field!("min_temp", [MinTemp], qc: min_temp, fields: [min_temp, min_temp_dates]),
    aggregate_field!("min_temp_mean", [MinTemp], qc: avg_min_temp, fields: [min_temp_mean]),
    aggregate_field!("num_min_le_32", [MinTemp], qc: min_le_32, fields: [num_min_le_32]),
    aggregate_field!("num_min_le_0", [MinTemp], qc: min_le_0, fields: [num_min_le_0]),
    aggregate_field!("num_min_ge_t4", [MinTemp], fields: [num_min_ge_t4]),
    aggregate_field!("num_min_le_t5", [MinTemp], fields: [num_min_le_t5]),
    aggregate_field!("num_min_le_t6", [MinTemp], fields: [num_min_le_t6]),
    aggregate_field!("mean_temp", [MaxTemp, MinTemp], qc: mean_temp, fields: [mean_temp]),
    aggregate_field!("num_heat_total", [MaxTemp, MinTemp], qc: heat, fields: [num_heat_total]),
    aggregate_field!("num_cool_total", [MaxTemp, MinTemp], qc: cool, fields: [num_cool_total]),
    aggregate_field!("precip_total", [Precip], qc: precip, fields: [precip_total, precip_mean_day]),
    aggregate_field!("num_precip_ge_01", [Precip], qc: precip_ge_01, fields: [num_precip_ge_01]),
    aggregate_field!("num_precip_ge_10", [Precip], qc: precip_ge_10, fields: [num_precip_ge_10]),
    aggregate_field!("num_precip_ge_50", [Precip], qc: precip_ge_50, fields: [num_precip_ge_50]),
    aggregate_field!("num_precip_ge_100", [Precip], qc: precip_ge_100, fields: [num_precip_ge_100]),
    aggregate_field!("num_precip_ge_p1", [Precip], fields: [num_precip_ge_p1]),
    aggregate_field!("num_precip_ge_p2", [Precip], fields: [num_precip_ge_p2]),
    aggregate_field!("snow_total", [Snow], fields: [snow_total]),
    aggregate_field!("num_snow_ge_trace", [Snow], fields: [num_snow_ge_trace]),
    aggregate_field!("num_snow_ge_1", [Snow], fields: [num_snow_ge_1]),
    aggregate_field!("num_snow_ge_s1", [Snow], fields: [num_snow_ge_s1]),
    aggregate_field!(
        "snow_ground_max",
        [Depth],
        qc: max_depth,
        fields: [snow_ground_max, snow_ground_max_dates]
    ),
    aggregate_field!("avg_wind_speed", [Wind], fields: [avg_wind_speed]),
    aggregate_field!("result_wind", [Wind], fields: [result_wind]),
    aggregate_field!("max_wind", [Wind], fields: [max_wind_list, max_wind_dates]),
    aggregate_field!("max_gust", [Gust], fields: [max_gust_list, max_gust_dates]),
    aggregate_field!("poss_sun", [Sun], qc: poss_sun, fields: [poss_sun]),
    aggregate_field!("mean_sky_cover", [Sky], fields: [mean_sky_cover]),
    aggregate_field!("num_fair_days", [Sky], qc: fair_days, fields: [num_fair_days]),
    aggregate_field!(
        "num_partly_cloudy_days",
        [Sky],
        qc: pc_days,
        fields: [num_partly_cloudy_days]
    ),
    aggregate_field!("num_cloudy_days", [Sky], qc: cloudy_days, fields: [num_cloudy_days]),
    aggregate_field!("mean_rh", [RelHumidity], fields: [mean_rh]),
    aggregate_field!("weather_days", [Weather], fields: [weather_days]),
];

pub fn field_named(name: &str) -> Option<&'static AggregateField> {
    AGGREGATE_FIELDS.iter().find(|f| f.name == name)
}

pub fn fields_for(category: ChangeCategory) -> impl Iterator<Item = &'static AggregateField> {
    AGGREGATE_FIELDS
        .iter()
        .filter(move |f| f.categories.contains(&category))
}

/// What a merge did, by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Fields that took the rebuilt value.
    pub replaced: Vec<&'static str>,
    /// Fields left alone because their provenance does not accept a
    /// rebuild (hand entered, from the monthly summary message, or with no
    /// recorded method).
    pub protected: Vec<&'static str>,
}

/// Merge `rebuilt` into `existing` for the fields fed by `changed`.
///
/// Ungoverned fields are always replaced. Governed fields are replaced,
/// together with their provenance, only when the stored provenance accepts
/// a rebuild. Fields outside the changed categories are never touched.
pub fn merge_aggregate(
    existing: &PeriodAggregate,
    rebuilt: &PeriodAggregate,
    changed: &ChangeSet,
) -> (PeriodAggregate, MergeSummary) {
    let mut merged = existing.clone();
    let mut rebuilt_methods = rebuilt.methods;
    let mut summary = MergeSummary::default();

    for field in AGGREGATE_FIELDS.iter().filter(|f| f.affected_by(changed)) {
        if let Some(slot) = field.provenance {
            let current = *slot(&mut merged.methods);
            if !current.accepts_rebuild() {
                log::debug!("merge: keeping {} ({})", field.name, current);
                summary.protected.push(field.name);
                continue;
            }
            field.copy_value(&mut merged, rebuilt);
            *slot(&mut merged.methods) = *slot(&mut rebuilt_methods);
        } else {
            field.copy_value(&mut merged, rebuilt);
        }
        summary.replaced.push(field.name);
    }
    (merged, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clqc_core::date_range::DateRange;
    use clqc_core::observation::Wind;
    use clqc_core::period::PeriodType;
    use std::collections::HashSet;

    fn january() -> DateRange {
        DateRange(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    fn aggregate() -> PeriodAggregate {
        PeriodAggregate::missing("KSEA", PeriodType::Monthly, january())
    }

    #[test]
    fn test_every_category_feeds_some_field() {
        for category in ChangeCategory::ALL {
            assert!(
                fields_for(category).next().is_some(),
                "{} should feed at least one field",
                category
            );
        }
    }

    #[test]
    fn test_field_names_are_unique() {
        let names: HashSet<&str> = AGGREGATE_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), AGGREGATE_FIELDS.len());
    }

    #[test]
    fn test_every_provenance_entry_is_wired_once() {
        // Mark each governed field's slot with a distinct code and check
        // that no two fields share a slot and no slot is left unwired.
        let mut methods = PeriodDataMethods::default();
        let governed: Vec<&AggregateField> =
            AGGREGATE_FIELDS.iter().filter(|f| f.is_governed()).collect();
        for (i, field) in governed.iter().enumerate() {
            let slot = field.provenance.unwrap();
            let shared = *slot(&mut methods);
            assert_eq!(shared, FieldProvenance::Missing, "{} shares a slot", field.name);
            *slot(&mut methods) = FieldProvenance::from_code(3 + (i as i32 % 16));
        }
        assert_eq!(governed.len(), 21);
        let json = serde_json::to_value(methods).unwrap();
        for (name, code) in json.as_object().unwrap() {
            assert_ne!(code.as_i64(), Some(-1), "{} is not wired to a field", name);
        }
    }

    #[test]
    fn test_merge_respects_provenance() {
        let mut existing = aggregate();
        existing.max_temp = 50;
        existing.methods.max_temp = FieldProvenance::ValueFromDaily;
        existing.max_temp_mean = 41.0;
        existing.methods.avg_max_temp = FieldProvenance::ManualEntry;
        existing.num_max_ge_90 = 0;
        existing.methods.max_temp_ge_90 = FieldProvenance::ValueFromMsm;
        existing.mean_temp = 36.0;
        existing.methods.mean_temp = FieldProvenance::from_code(4);
        existing.min_temp = 20;
        existing.methods.min_temp = FieldProvenance::ValueFromDaily;

        let mut rebuilt = aggregate();
        rebuilt.max_temp = 55;
        rebuilt.max_temp_dates = vec![NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()];
        rebuilt.methods.max_temp = FieldProvenance::ValueFromDaily;
        rebuilt.max_temp_mean = 42.5;
        rebuilt.num_max_ge_90 = 2;
        rebuilt.num_max_ge_t1 = 4;
        rebuilt.mean_temp = 37.5;
        rebuilt.methods.mean_temp = FieldProvenance::ValueFromDaily;
        rebuilt.num_heat_total = 850;
        rebuilt.min_temp = 18;

        let changed: ChangeSet = [ChangeCategory::MaxTemp].into_iter().collect();
        let (merged, summary) = merge_aggregate(&existing, &rebuilt, &changed);

        assert_eq!(merged.max_temp, 55);
        assert_eq!(merged.max_temp_dates, rebuilt.max_temp_dates);
        assert_eq!(merged.methods.max_temp, FieldProvenance::ValueFromDaily);
        assert_eq!(merged.mean_temp, 37.5);
        assert_eq!(merged.max_temp_mean, 41.0);
        assert_eq!(merged.methods.avg_max_temp, FieldProvenance::ManualEntry);
        assert_eq!(merged.num_max_ge_90, 0);
        assert_eq!(merged.methods.max_temp_ge_90, FieldProvenance::ValueFromMsm);
        // ungoverned count always follows the rebuild
        assert_eq!(merged.num_max_ge_t1, 4);
        // min temp is outside the changed categories
        assert_eq!(merged.min_temp, 20);
        assert_eq!(
            summary.protected,
            vec![
                "max_temp_mean",
                "num_max_ge_90",
                "num_max_le_32",
                "num_heat_total",
                "num_cool_total"
            ]
        );
        assert!(summary.replaced.contains(&"max_temp"));
        assert!(summary.replaced.contains(&"mean_temp"));
        assert!(!summary.replaced.contains(&"min_temp"));
    }

    #[test]
    fn test_merge_keeps_fields_without_a_recorded_method() {
        let mut existing = aggregate();
        existing.max_temp = 60;
        assert_eq!(existing.methods.max_temp, FieldProvenance::Missing);

        let mut rebuilt = aggregate();
        rebuilt.max_temp = 55;
        rebuilt.methods.max_temp = FieldProvenance::ValueFromDaily;

        let changed: ChangeSet = [ChangeCategory::MaxTemp].into_iter().collect();
        let (merged, summary) = merge_aggregate(&existing, &rebuilt, &changed);

        assert_eq!(merged.max_temp, 60);
        assert_eq!(merged.methods.max_temp, FieldProvenance::Missing);
        assert!(!summary.replaced.contains(&"max_temp"));
        assert!(summary.protected.contains(&"max_temp"));
    }

    #[test]
    fn test_merge_with_empty_change_set_is_identity() {
        let mut existing = aggregate();
        existing.max_wind_list = vec![Wind::new(270, 40.0)];
        let mut rebuilt = aggregate();
        rebuilt.max_wind_list = vec![Wind::new(180, 55.0)];
        let (merged, summary) = merge_aggregate(&existing, &rebuilt, &ChangeSet::new());
        assert_eq!(merged, existing);
        assert!(summary.replaced.is_empty());
        assert!(summary.protected.is_empty());
    }

    #[test]
    fn test_same_value_compares_every_part() {
        let a = aggregate();
        let mut b = aggregate();
        let field = field_named("max_temp").unwrap();
        assert!(field.same_value(&a, &b));
        b.max_temp_dates.push(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(!field.same_value(&a, &b));
        assert_eq!(field.provenance_in(&a), Some(FieldProvenance::Missing));
        assert_eq!(field_named("mean_rh").unwrap().provenance_in(&a), None);
    }
}
