//! Fixture loading for populating the in-memory database.
//!
//! Every CSV fixture has a header row and columns are matched by name, so
//! columns may be omitted or reordered. An empty cell (or `M`) is a missing
//! value; `T` is a trace of precipitation or snow.
//!
//! # Fixture Formats
//!
//! - **daily.csv**: `station_id,date,max_temp,min_temp,max_rel_humid,min_rel_humid,
//!   max_wind_dir,max_wind_speed,max_gust_dir,max_gust_speed,result_wind_dir,
//!   result_wind_speed,avg_wind_speed,precip,snow_day,snow_ground,minutes_sun,
//!   percent_poss_sun,sky_cover,max_slp,min_slp,weather,methods`
//! - **records.csv**: `station_id,month,day,max_temp,max_temp_years,min_temp,
//!   min_temp_years,precip,precip_years,snow,snow_years` (years are `;`-separated)
//! - **period_records.csv**: `station_id,period_type,month` followed by the
//!   record columns of records.csv; `month` is the month the period ends in
//! - **aggregates.json**: array of aggregates; fields left out are missing
//! - **freeze.csv**: `station_id,season_start,season_end,early_freeze,late_freeze`

use crate::Database;
use clqc_core::date_range::DateRange;
use clqc_core::freeze::FreezeDates;
use clqc_core::missing::{
    MISSING, MISSING_PRECIP, MISSING_SKY, MISSING_SLP, MISSING_SPEED, TRACE,
};
use clqc_core::observation::{DailyObservation, Wind};
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::record::{ExtremeKind, ExtremeRecord, ExtremeValues, PeriodRecord, RecordValues};
use clqc_core::weather::WeatherFlags;
use clqc_utils::dates::parse_date_any;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

pub const DAILY_FILE: &str = "daily.csv";
pub const RECORDS_FILE: &str = "records.csv";
pub const PERIOD_RECORDS_FILE: &str = "period_records.csv";
pub const AGGREGATES_FILE: &str = "aggregates.json";
pub const FREEZE_FILE: &str = "freeze.csv";

/// One CSV row with its columns looked up by header name.
struct Row<'a> {
    record: &'a csv::StringRecord,
    columns: &'a HashMap<String, usize>,
    line: u64,
}

impl<'a> Row<'a> {
    fn text(&self, name: &str) -> &'a str {
        self.columns
            .get(name)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    fn is_blank(&self, name: &str) -> bool {
        matches!(self.text(name), "" | "M")
    }

    fn required(&self, name: &str) -> anyhow::Result<&'a str> {
        let value = self.text(name);
        if value.is_empty() {
            anyhow::bail!("line {}: missing {}", self.line, name);
        }
        Ok(value)
    }

    fn int(&self, name: &str) -> anyhow::Result<i32> {
        if self.is_blank(name) {
            return Ok(MISSING);
        }
        self.text(name).parse().map_err(|e| self.bad(name, e))
    }

    fn float(&self, name: &str, missing: f64) -> anyhow::Result<f64> {
        if self.is_blank(name) {
            return Ok(missing);
        }
        self.text(name).parse().map_err(|e| self.bad(name, e))
    }

    fn bad(&self, name: &str, err: impl std::fmt::Display) -> anyhow::Error {
        anyhow::anyhow!("line {}: bad {} '{}': {}", self.line, name, self.text(name), err)
    }

    /// Precipitation, snowfall or depth: `T` is a trace.
    fn amount(&self, name: &str) -> anyhow::Result<f32> {
        if self.text(name).eq_ignore_ascii_case("T") {
            return Ok(TRACE);
        }
        Ok(self.float(name, MISSING_PRECIP as f64)? as f32)
    }

    fn wind(&self, prefix: &str) -> anyhow::Result<Wind> {
        let dir = self.int(&format!("{}_dir", prefix))?;
        let speed = self.float(&format!("{}_speed", prefix), MISSING_SPEED as f64)? as f32;
        Ok(Wind { dir, speed })
    }

    fn years(&self, name: &str) -> anyhow::Result<Vec<i32>> {
        self.text(name)
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse().map_err(|e| {
                    anyhow::anyhow!("line {}: bad year '{}' in {}: {}", self.line, s, name, e)
                })
            })
            .collect()
    }
}

/// Read a headed CSV and hand each row to `f`.
fn for_each_row(
    csv_data: &str,
    mut f: impl FnMut(&Row) -> anyhow::Result<()>,
) -> anyhow::Result<u32> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());
    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
        .collect();

    let mut count = 0u32;
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        f(&Row {
            record: &record,
            columns: &columns,
            line,
        })?;
        count += 1;
    }
    Ok(count)
}

fn parse_daily(row: &Row) -> anyhow::Result<DailyObservation> {
    let station_id = row.required("station_id")?;
    let date = parse_date_any(row.required("date")?)?;
    let mut obs = DailyObservation::missing(station_id, date);
    obs.max_temp = row.int("max_temp")?;
    obs.min_temp = row.int("min_temp")?;
    obs.max_rel_humid = row.int("max_rel_humid")?;
    obs.min_rel_humid = row.int("min_rel_humid")?;
    obs.max_wind = row.wind("max_wind")?;
    obs.max_gust = row.wind("max_gust")?;
    obs.result_wind = row.wind("result_wind")?;
    obs.avg_wind_speed = row.float("avg_wind_speed", MISSING_SPEED as f64)? as f32;
    obs.precip = row.amount("precip")?;
    obs.snow_day = row.amount("snow_day")?;
    obs.snow_ground = row.amount("snow_ground")?;
    obs.minutes_sun = row.int("minutes_sun")?;
    obs.percent_poss_sun = row.int("percent_poss_sun")?;
    obs.sky_cover = row.float("sky_cover", MISSING_SKY as f64)? as f32;
    obs.max_slp = row.float("max_slp", MISSING_SLP)?;
    obs.min_slp = row.float("min_slp", MISSING_SLP)?;
    obs.weather = WeatherFlags::parse_codes(row.text("weather"))?;
    if !row.text("methods").is_empty() {
        obs.methods = serde_json::from_str(row.text("methods"))?;
    }
    obs.refresh_derived();
    Ok(obs)
}

/// Column names of the record values, in file order. Each is followed by
/// a `<name>_years` column.
const RECORD_COLUMNS: [(ExtremeKind, &str); 4] = [
    (ExtremeKind::MaxTemp, "max_temp"),
    (ExtremeKind::MinTemp, "min_temp"),
    (ExtremeKind::Precip, "precip"),
    (ExtremeKind::Snow, "snow"),
];

fn read_record_values<R: RecordValues>(row: &Row, record: &mut R) -> anyhow::Result<()> {
    let values = ExtremeValues {
        max_temp: row.int("max_temp")?,
        min_temp: row.int("min_temp")?,
        precip: row.amount("precip")?,
        snow: row.amount("snow")?,
    };
    for (kind, column) in RECORD_COLUMNS {
        record.set_value(kind, &values);
        *record.years_mut(kind) = row.years(&format!("{}_years", column))?;
    }
    Ok(())
}

fn parse_record(row: &Row) -> anyhow::Result<ExtremeRecord> {
    let station_id = row.required("station_id")?;
    let month: u32 = row.required("month")?.parse()?;
    let day: u32 = row.required("day")?.parse()?;
    let mut record = ExtremeRecord::missing(station_id, month, day);
    read_record_values(row, &mut record)?;
    Ok(record)
}

fn parse_period_record(row: &Row) -> anyhow::Result<PeriodRecord> {
    let station_id = row.required("station_id")?;
    let period_type: PeriodType = row.required("period_type")?.parse()?;
    let month: u32 = row.required("month")?.parse()?;
    if !(1..=12).contains(&month) {
        anyhow::bail!("line {}: bad month {}", row.line, month);
    }
    let mut record = PeriodRecord::missing(station_id, period_type, month);
    read_record_values(row, &mut record)?;
    Ok(record)
}

fn parse_freeze(row: &Row) -> anyhow::Result<FreezeDates> {
    let optional = |name: &str| -> anyhow::Result<_> {
        if row.is_blank(name) {
            Ok(None)
        } else {
            Ok(Some(parse_date_any(row.text(name))?))
        }
    };
    Ok(FreezeDates {
        station_id: row.required("station_id")?.to_string(),
        season: DateRange(
            parse_date_any(row.required("season_start")?)?,
            parse_date_any(row.required("season_end")?)?,
        ),
        early_freeze: optional("early_freeze")?,
        late_freeze: optional("late_freeze")?,
    })
}

/// Overlay `patch` onto `base`, descending into nested objects.
fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Parse one fixture aggregate. Only the identifying fields are required;
/// everything else starts from the all-missing aggregate.
fn parse_aggregate(value: Value) -> anyhow::Result<PeriodAggregate> {
    let station_id = value
        .get("station_id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("aggregate without station_id"))?;
    let period_type: PeriodType = serde_json::from_value(
        value
            .get("period_type")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("aggregate for {} without period_type", station_id))?,
    )?;
    let range: DateRange = serde_json::from_value(
        value
            .get("range")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("aggregate for {} without range", station_id))?,
    )?;
    let mut base = serde_json::to_value(PeriodAggregate::missing(station_id, period_type, range))?;
    overlay(&mut base, value);
    Ok(serde_json::from_value(base)?)
}

impl Database {
    /// Load daily observations from CSV. Derived fields are recomputed.
    ///
    /// # Example CSV
    /// ```text
    /// station_id,date,max_temp,min_temp,precip,weather
    /// KSEA,2024-01-15,50,30,T,RA;FG
    /// ```
    pub fn load_daily_csv(&self, csv_data: &str) -> anyhow::Result<()> {
        let count = for_each_row(csv_data, |row| self.store_daily(&parse_daily(row)?))?;
        log::info!("[CLQC Debug] loader: Loaded {} daily observations", count);
        Ok(())
    }

    /// Load historical records from CSV.
    ///
    /// # Example CSV
    /// ```text
    /// station_id,month,day,max_temp,max_temp_years,min_temp,min_temp_years
    /// KSEA,1,15,55,1953,2,1950;1962
    /// ```
    pub fn load_records_csv(&self, csv_data: &str) -> anyhow::Result<()> {
        let count = for_each_row(csv_data, |row| self.store_record(&parse_record(row)?))?;
        log::info!("[CLQC Debug] loader: Loaded {} record rows", count);
        Ok(())
    }

    /// Load period records from CSV.
    ///
    /// # Example CSV
    /// ```text
    /// station_id,period_type,month,precip,precip_years,snow,snow_years
    /// KSEA,monthly,1,12.92,1953,57.2,1950
    /// ```
    pub fn load_period_records_csv(&self, csv_data: &str) -> anyhow::Result<()> {
        let count = for_each_row(csv_data, |row| {
            self.store_period_record(&parse_period_record(row)?)
        })?;
        log::info!("[CLQC Debug] loader: Loaded {} period record rows", count);
        Ok(())
    }

    /// Load period aggregates from a JSON array.
    pub fn load_aggregates_json(&self, json: &str) -> anyhow::Result<()> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        let count = values.len();
        for value in values {
            self.store_aggregate(&parse_aggregate(value)?)?;
        }
        log::info!("[CLQC Debug] loader: Loaded {} period aggregates", count);
        Ok(())
    }

    /// Load stored freeze dates from CSV.
    pub fn load_freeze_csv(&self, csv_data: &str) -> anyhow::Result<()> {
        let count = for_each_row(csv_data, |row| self.store_freeze_dates(&parse_freeze(row)?))?;
        log::info!("[CLQC Debug] loader: Loaded {} freeze seasons", count);
        Ok(())
    }

    /// Load every fixture file present in `dir`. `daily.csv` is required;
    /// the others are optional.
    pub fn load_fixture_dir(&self, dir: &Path) -> anyhow::Result<()> {
        let read = |name: &str| -> anyhow::Result<Option<String>> {
            let path = dir.join(name);
            if !path.exists() {
                log::info!("[CLQC Debug] loader: {} not present", path.display());
                return Ok(None);
            }
            std::fs::read_to_string(&path)
                .map(Some)
                .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))
        };

        let daily = read(DAILY_FILE)?
            .ok_or_else(|| anyhow::anyhow!("{} not found in {}", DAILY_FILE, dir.display()))?;
        self.load_daily_csv(&daily)?;
        if let Some(records) = read(RECORDS_FILE)? {
            self.load_records_csv(&records)?;
        }
        if let Some(records) = read(PERIOD_RECORDS_FILE)? {
            self.load_period_records_csv(&records)?;
        }
        if let Some(aggregates) = read(AGGREGATES_FILE)? {
            self.load_aggregates_json(&aggregates)?;
        }
        if let Some(freeze) = read(FREEZE_FILE)? {
            self.load_freeze_csv(&freeze)?;
        }
        Ok(())
    }
}
