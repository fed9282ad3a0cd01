//! `field=value` edits from the command line.
//!
//! An edit names a stored field (nested wind parts as `max_wind.speed`) and
//! a new value. `T` is a trace, `M` is missing, and `weather` takes a
//! `;`-separated list of phenomenon codes.

use clqc_core::missing::{MISSING, TRACE};
use clqc_core::weather::WeatherFlags;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

/// Fields that identify a record, are derived, or carry provenance. They
/// are never edited directly.
const NOT_EDITABLE: &[&str] = &[
    "station_id",
    "date",
    "period_type",
    "range",
    "methods",
    "num_wx",
    "num_heat",
    "num_cool",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: String,
    pub value: String,
}

impl FromStr for Assignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected FIELD=VALUE, got '{}'", s))?;
        let field = field.trim();
        if field.is_empty() {
            anyhow::bail!("empty field name in '{}'", s);
        }
        Ok(Assignment {
            field: field.to_ascii_lowercase(),
            value: value.trim().to_string(),
        })
    }
}

fn parse_scalar(raw: &str) -> anyhow::Result<Value> {
    match raw {
        "T" | "t" => Ok(Value::from(TRACE as f64)),
        "M" | "m" | "" => Ok(Value::from(MISSING)),
        s => {
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::from(i))
            } else {
                let f: f64 = s
                    .parse()
                    .map_err(|_| anyhow::anyhow!("'{}' is not a number, T or M", s))?;
                Ok(Value::from(f))
            }
        }
    }
}

fn field_slot<'v>(root: &'v mut Value, path: &str) -> anyhow::Result<&'v mut Value> {
    let mut slot = root;
    for part in path.split('.') {
        slot = slot
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("unknown field '{}'", path))?;
    }
    Ok(slot)
}

fn apply_one(root: &mut Value, edit: &Assignment) -> anyhow::Result<()> {
    let top = edit.field.split('.').next().unwrap_or_default();
    if NOT_EDITABLE.contains(&top) {
        anyhow::bail!("field '{}' cannot be edited", edit.field);
    }
    let slot = field_slot(root, &edit.field)?;
    if edit.field == "weather" && slot.is_array() {
        *slot = serde_json::to_value(WeatherFlags::parse_codes(&edit.value)?)?;
        return Ok(());
    }
    if slot.is_object() || slot.is_array() {
        anyhow::bail!("field '{}' is not a single value", edit.field);
    }
    *slot = parse_scalar(&edit.value)?;
    Ok(())
}

/// A copy of `record` with every edit applied, or the first edit that does
/// not fit the record.
pub fn apply_edits<T: Serialize + DeserializeOwned>(
    record: &T,
    edits: &[Assignment],
) -> anyhow::Result<T> {
    let mut value = serde_json::to_value(record)?;
    for edit in edits {
        apply_one(&mut value, edit)?;
        log::debug!("edit: {} = {}", edit.field, edit.value);
    }
    serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("edit does not fit the record: {}", e))
}

/// Parse every `--set` argument.
pub fn parse_assignments(args: &[String]) -> anyhow::Result<Vec<Assignment>> {
    args.iter().map(|a| a.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clqc_core::date_range::DateRange;
    use clqc_core::observation::DailyObservation;
    use clqc_core::period::{PeriodAggregate, PeriodType};
    use clqc_core::weather::WeatherPhenomenon;

    fn daily() -> DailyObservation {
        DailyObservation::missing("KSEA", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    }

    fn edits(args: &[&str]) -> Vec<Assignment> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_assignments(&args).unwrap()
    }

    #[test]
    fn test_parse_assignment() {
        let a: Assignment = " Max_Temp = 55 ".parse().unwrap();
        assert_eq!(a.field, "max_temp");
        assert_eq!(a.value, "55");
        assert!("max_temp".parse::<Assignment>().is_err());
        assert!("=55".parse::<Assignment>().is_err());
    }

    #[test]
    fn test_daily_edits() {
        let edited = apply_edits(
            &daily(),
            &edits(&[
                "max_temp=55",
                "precip=T",
                "max_wind.speed=22.5",
                "max_wind.dir=270",
                "weather=TS;GR",
            ]),
        )
        .unwrap();
        assert_eq!(edited.max_temp, 55);
        assert_eq!(edited.precip, TRACE);
        assert_eq!(edited.max_wind.speed, 22.5);
        assert_eq!(edited.max_wind.dir, 270);
        assert!(edited.weather.get(WeatherPhenomenon::Thunderstorm));
        assert_eq!(edited.weather.count(), 2);
    }

    #[test]
    fn test_missing_value() {
        let mut obs = daily();
        obs.max_temp = 50;
        let edited = apply_edits(&obs, &edits(&["max_temp=M"])).unwrap();
        assert_eq!(edited.max_temp, MISSING);
    }

    #[test]
    fn test_rejected_edits() {
        let obs = daily();
        assert!(apply_edits(&obs, &edits(&["max_tmp=55"])).is_err());
        assert!(apply_edits(&obs, &edits(&["date=2024-01-16"])).is_err());
        assert!(apply_edits(&obs, &edits(&["methods.max_temp=0"])).is_err());
        assert!(apply_edits(&obs, &edits(&["max_wind=5"])).is_err());
        assert!(apply_edits(&obs, &edits(&["max_temp=warm"])).is_err());
        // a trace is not a temperature
        assert!(apply_edits(&obs, &edits(&["max_temp=T"])).is_err());
        assert!(apply_edits(&obs, &edits(&["weather=XX"])).is_err());
    }

    #[test]
    fn test_period_edits() {
        let range = DateRange(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let agg = PeriodAggregate::missing("KSEA", PeriodType::Monthly, range);
        let edited = apply_edits(&agg, &edits(&["max_temp=61", "snow_total=2.5"])).unwrap();
        assert_eq!(edited.max_temp, 61);
        assert_eq!(edited.snow_total, 2.5);
        assert!(apply_edits(&agg, &edits(&["max_temp_dates=5"])).is_err());
        assert!(apply_edits(&agg, &edits(&["range=5"])).is_err());
    }
}
