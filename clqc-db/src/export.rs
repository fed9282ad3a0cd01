//! Writes a station's stored data back out in the fixture formats read by
//! the loader, so a reconciled store can be reloaded later.

use crate::loader::{AGGREGATES_FILE, DAILY_FILE, FREEZE_FILE, PERIOD_RECORDS_FILE, RECORDS_FILE};
use crate::Database;
use clqc_core::missing::{is_trace, Sentinel};
use clqc_core::observation::Wind;
use clqc_core::record::{ExtremeKind, RecordValues};
use clqc_utils::dates::format_date;
use std::path::Path;

const DAILY_HEADER: [&str; 23] = [
    "station_id",
    "date",
    "max_temp",
    "min_temp",
    "max_rel_humid",
    "min_rel_humid",
    "max_wind_dir",
    "max_wind_speed",
    "max_gust_dir",
    "max_gust_speed",
    "result_wind_dir",
    "result_wind_speed",
    "avg_wind_speed",
    "precip",
    "snow_day",
    "snow_ground",
    "minutes_sun",
    "percent_poss_sun",
    "sky_cover",
    "max_slp",
    "min_slp",
    "weather",
    "methods",
];

const RECORDS_HEADER: [&str; 11] = [
    "station_id",
    "month",
    "day",
    "max_temp",
    "max_temp_years",
    "min_temp",
    "min_temp_years",
    "precip",
    "precip_years",
    "snow",
    "snow_years",
];

const PERIOD_RECORDS_HEADER: [&str; 11] = [
    "station_id",
    "period_type",
    "month",
    "max_temp",
    "max_temp_years",
    "min_temp",
    "min_temp_years",
    "precip",
    "precip_years",
    "snow",
    "snow_years",
];

const FREEZE_HEADER: [&str; 5] =
    ["station_id", "season_start", "season_end", "early_freeze", "late_freeze"];

fn cell<T: Sentinel + ToString>(value: T) -> String {
    if value.is_missing() {
        String::new()
    } else {
        value.to_string()
    }
}

fn amount_cell(value: f32) -> String {
    if is_trace(value) {
        "T".to_string()
    } else {
        cell(value)
    }
}

fn wind_cells(wind: &Wind) -> [String; 2] {
    [cell(wind.dir), cell(wind.speed)]
}

fn years_cell(years: &[i32]) -> String {
    years.iter().map(i32::to_string).collect::<Vec<_>>().join(";")
}

/// Value and years cells of a record, in header order.
fn record_cells<R: RecordValues>(record: &R) -> [String; 8] {
    let values = record.values();
    [
        cell(values.max_temp),
        years_cell(record.years(ExtremeKind::MaxTemp)),
        cell(values.min_temp),
        years_cell(record.years(ExtremeKind::MinTemp)),
        amount_cell(values.precip),
        years_cell(record.years(ExtremeKind::Precip)),
        amount_cell(values.snow),
        years_cell(record.years(ExtremeKind::Snow)),
    ]
}

fn finish(writer: csv::Writer<Vec<u8>>) -> anyhow::Result<String> {
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("flushing csv: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

impl Database {
    /// Daily observations for a station as `daily.csv`.
    pub fn export_daily_csv(&self, station_id: &str) -> anyhow::Result<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(DAILY_HEADER)?;
        for obs in self.query_station_dailies(station_id)? {
            let [max_wind_dir, max_wind_speed] = wind_cells(&obs.max_wind);
            let [max_gust_dir, max_gust_speed] = wind_cells(&obs.max_gust);
            let [result_wind_dir, result_wind_speed] = wind_cells(&obs.result_wind);
            writer.write_record([
                obs.station_id.clone(),
                format_date(&obs.date),
                cell(obs.max_temp),
                cell(obs.min_temp),
                cell(obs.max_rel_humid),
                cell(obs.min_rel_humid),
                max_wind_dir,
                max_wind_speed,
                max_gust_dir,
                max_gust_speed,
                result_wind_dir,
                result_wind_speed,
                cell(obs.avg_wind_speed),
                amount_cell(obs.precip),
                amount_cell(obs.snow_day),
                amount_cell(obs.snow_ground),
                cell(obs.minutes_sun),
                cell(obs.percent_poss_sun),
                cell(obs.sky_cover),
                cell(obs.max_slp),
                cell(obs.min_slp),
                obs.weather.to_codes(),
                serde_json::to_string(&obs.methods)?,
            ])?;
        }
        finish(writer)
    }

    /// Historical records for a station as `records.csv`.
    pub fn export_records_csv(&self, station_id: &str) -> anyhow::Result<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(RECORDS_HEADER)?;
        for record in self.query_station_records(station_id)? {
            let mut row = vec![
                record.station_id.clone(),
                record.month.to_string(),
                record.day.to_string(),
            ];
            row.extend(record_cells(&record));
            writer.write_record(&row)?;
        }
        finish(writer)
    }

    /// Period records for a station as `period_records.csv`.
    pub fn export_period_records_csv(&self, station_id: &str) -> anyhow::Result<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(PERIOD_RECORDS_HEADER)?;
        for record in self.query_station_period_records(station_id)? {
            let mut row = vec![
                record.station_id.clone(),
                record.period_type.as_str().to_string(),
                record.month.to_string(),
            ];
            row.extend(record_cells(&record));
            writer.write_record(&row)?;
        }
        finish(writer)
    }

    /// Period aggregates for a station as a pretty JSON array.
    pub fn export_aggregates_json(&self, station_id: &str) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.query_station_aggregates(station_id)?)?)
    }

    /// Freeze dates for a station as `freeze.csv`.
    pub fn export_freeze_csv(&self, station_id: &str) -> anyhow::Result<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(FREEZE_HEADER)?;
        for dates in self.query_station_freeze_dates(station_id)? {
            writer.write_record([
                dates.station_id.clone(),
                format_date(&dates.season.start()),
                format_date(&dates.season.end()),
                dates.early_freeze.as_ref().map(format_date).unwrap_or_default(),
                dates.late_freeze.as_ref().map(format_date).unwrap_or_default(),
            ])?;
        }
        finish(writer)
    }

    /// Write every fixture file for a station into `dir`, creating it if
    /// needed. The result can be loaded with [`Database::load_fixture_dir`].
    pub fn export_fixture_dir(&self, station_id: &str, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(DAILY_FILE), self.export_daily_csv(station_id)?)?;
        std::fs::write(dir.join(RECORDS_FILE), self.export_records_csv(station_id)?)?;
        let period_records = self.export_period_records_csv(station_id)?;
        std::fs::write(dir.join(PERIOD_RECORDS_FILE), period_records)?;
        std::fs::write(dir.join(AGGREGATES_FILE), self.export_aggregates_json(station_id)?)?;
        std::fs::write(dir.join(FREEZE_FILE), self.export_freeze_csv(station_id)?)?;
        log::info!(
            "[CLQC Debug] export: wrote fixtures for {} to {}",
            station_id,
            dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use chrono::NaiveDate;
    use clqc_core::missing::TRACE;
    use clqc_core::observation::{DailyObservation, Wind};
    use clqc_core::period::{PeriodAggregate, PeriodType};
    use clqc_core::provenance::FieldProvenance;
    use clqc_core::record::{ExtremeRecord, PeriodRecord};
    use clqc_core::weather::WeatherFlags;

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn daily_csv_uses_fixture_conventions() {
        let db = Database::new().unwrap();
        let mut obs = DailyObservation::missing("KSEA", jan15());
        obs.max_temp = 55;
        obs.precip = TRACE;
        obs.max_wind = Wind::new(270, 22.5);
        obs.weather = WeatherFlags::parse_codes("RA;FG").unwrap();
        obs.methods.max_temp = FieldProvenance::ManualEntry;
        db.store_daily(&obs).unwrap();

        let csv = db.export_daily_csv("KSEA").unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("station_id,date,max_temp,min_temp"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("KSEA,2024-01-15,55,,,,270,22.5,"), "{}", row);
        assert!(row.contains(",T,"), "{}", row);
        assert!(row.contains("RA;FG"), "{}", row);
        assert!(lines.next().is_none());
    }

    #[test]
    fn exported_fixtures_reload() {
        let db = Database::new().unwrap();
        let mut obs = DailyObservation::missing("KSEA", jan15());
        obs.max_temp = 55;
        obs.min_temp = 30;
        obs.snow_day = TRACE;
        obs.methods.max_temp = FieldProvenance::ManualEntry;
        obs.refresh_derived();
        db.store_daily(&obs).unwrap();

        let mut record = ExtremeRecord::missing("KSEA", 1, 15);
        record.max_temp = 55;
        record.max_temp_years = vec![1953, 2024];
        db.store_record(&record).unwrap();

        let mut winter = PeriodRecord::missing("KSEA", PeriodType::Seasonal, 2);
        winter.precip = 14.1;
        winter.precip_years = vec![2024];
        winter.snow = TRACE;
        winter.snow_years = vec![1999, 2005];
        db.store_period_record(&winter).unwrap();

        let range = PeriodType::Monthly.range_for(&jan15()).unwrap();
        let mut monthly = PeriodAggregate::missing("KSEA", PeriodType::Monthly, range);
        monthly.max_temp = 55;
        monthly.max_temp_dates = vec![jan15()];
        monthly.methods.max_temp = FieldProvenance::ValueFromDaily;
        db.store_aggregate(&monthly).unwrap();

        let dir = std::env::temp_dir().join(format!("clqc-db-export-{}", std::process::id()));
        db.export_fixture_dir("KSEA", &dir).unwrap();

        let reloaded = Database::new().unwrap();
        reloaded.load_fixture_dir(&dir).unwrap();
        assert_eq!(reloaded.query_daily("KSEA", jan15()).unwrap(), Some(obs));
        assert_eq!(reloaded.query_record("KSEA", 1, 15).unwrap(), Some(record));
        assert_eq!(
            reloaded.query_period_record("KSEA", PeriodType::Seasonal, 2).unwrap(),
            Some(winter)
        );
        assert_eq!(
            reloaded.query_aggregate("KSEA", PeriodType::Monthly, range).unwrap(),
            Some(monthly)
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
