//! Typed reads and writes against the climate tables.
//!
//! Records travel as JSON payloads; the key columns exist for lookups and
//! ordering only.

use crate::Database;
use chrono::{Datelike, NaiveDate};
use clqc_core::date_range::DateRange;
use clqc_core::freeze::FreezeDates;
use clqc_core::observation::DailyObservation;
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::record::{ExtremeRecord, PeriodRecord};
use clqc_utils::dates::{format_date, parse_date};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;

fn decode<T: DeserializeOwned>(payloads: Vec<String>) -> anyhow::Result<Vec<T>> {
    payloads
        .iter()
        .map(|p| serde_json::from_str(p).map_err(anyhow::Error::from))
        .collect()
}

fn parse_optional_date(value: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}

impl Database {
    // ───────────────────── Daily Observations ─────────────────────

    pub fn query_daily(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyObservation>> {
        let conn = self.conn.borrow();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM daily_observations WHERE station_id = ?1 AND date = ?2",
                params![station_id, format_date(&date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(decode(payload.into_iter().collect())?.pop())
    }

    /// Daily observations for a station within `range`, ordered by date.
    pub fn query_dailies(
        &self,
        station_id: &str,
        range: DateRange,
    ) -> anyhow::Result<Vec<DailyObservation>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT payload FROM daily_observations
             WHERE station_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let payloads = stmt
            .query_map(
                params![station_id, format_date(&range.start()), format_date(&range.end())],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<String>, _>>()?;
        let rows: Vec<DailyObservation> = decode(payloads)?;
        log::info!(
            "[CLQC Debug] query: query_dailies {} {} returned {} records",
            station_id,
            range,
            rows.len()
        );
        Ok(rows)
    }

    pub fn query_station_dailies(&self, station_id: &str) -> anyhow::Result<Vec<DailyObservation>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT payload FROM daily_observations WHERE station_id = ?1 ORDER BY date",
        )?;
        let payloads = stmt
            .query_map(params![station_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        decode(payloads)
    }

    /// Most recent date with a daily observation for the station.
    pub fn query_latest_date(&self, station_id: &str) -> anyhow::Result<Option<NaiveDate>> {
        let conn = self.conn.borrow();
        let latest: Option<String> = conn.query_row(
            "SELECT MAX(date) FROM daily_observations WHERE station_id = ?1",
            params![station_id],
            |row| row.get(0),
        )?;
        parse_optional_date(latest)
    }

    /// First and last date in `season` with a minimum of 32 °F or below.
    pub fn query_freeze_extent(
        &self,
        station_id: &str,
        season: DateRange,
    ) -> anyhow::Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let conn = self.conn.borrow();
        // missing minima are 9999 and never match
        let (first, last): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(date), MAX(date) FROM daily_observations
             WHERE station_id = ?1 AND date >= ?2 AND date <= ?3 AND min_temp <= 32",
            params![station_id, format_date(&season.start()), format_date(&season.end())],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((parse_optional_date(first)?, parse_optional_date(last)?))
    }

    pub fn store_daily(&self, observation: &DailyObservation) -> anyhow::Result<()> {
        let payload = serde_json::to_string(observation)?;
        self.conn.borrow().execute(
            "INSERT OR REPLACE INTO daily_observations (station_id, date, min_temp, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                observation.station_id,
                format_date(&observation.date),
                observation.min_temp,
                payload
            ],
        )?;
        Ok(())
    }

    // ───────────────────── Historical Records ─────────────────────

    pub fn query_record(
        &self,
        station_id: &str,
        month: u32,
        day: u32,
    ) -> anyhow::Result<Option<ExtremeRecord>> {
        let conn = self.conn.borrow();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM extreme_records
                 WHERE station_id = ?1 AND month = ?2 AND day = ?3",
                params![station_id, month, day],
                |row| row.get(0),
            )
            .optional()?;
        Ok(decode(payload.into_iter().collect())?.pop())
    }

    /// The records row for the calendar day of `date`.
    pub fn query_record_for(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<ExtremeRecord>> {
        self.query_record(station_id, date.month(), date.day())
    }

    pub fn query_station_records(&self, station_id: &str) -> anyhow::Result<Vec<ExtremeRecord>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT payload FROM extreme_records WHERE station_id = ?1 ORDER BY month, day",
        )?;
        let payloads = stmt
            .query_map(params![station_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        decode(payloads)
    }

    pub fn store_record(&self, record: &ExtremeRecord) -> anyhow::Result<()> {
        let payload = serde_json::to_string(record)?;
        self.conn.borrow().execute(
            "INSERT OR REPLACE INTO extreme_records (station_id, month, day, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![record.station_id, record.month, record.day, payload],
        )?;
        Ok(())
    }

    // ───────────────────── Period Records ─────────────────────

    pub fn query_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        month: u32,
    ) -> anyhow::Result<Option<PeriodRecord>> {
        let conn = self.conn.borrow();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM period_records
                 WHERE station_id = ?1 AND period_type = ?2 AND month = ?3",
                params![station_id, period_type.as_str(), month],
                |row| row.get(0),
            )
            .optional()?;
        Ok(decode(payload.into_iter().collect())?.pop())
    }

    /// The period records row for the month `range` ends in.
    pub fn query_period_record_for(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodRecord>> {
        self.query_period_record(station_id, period_type, range.end().month())
    }

    pub fn query_station_period_records(
        &self,
        station_id: &str,
    ) -> anyhow::Result<Vec<PeriodRecord>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT payload FROM period_records WHERE station_id = ?1
             ORDER BY period_type, month",
        )?;
        let payloads = stmt
            .query_map(params![station_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        decode(payloads)
    }

    pub fn store_period_record(&self, record: &PeriodRecord) -> anyhow::Result<()> {
        let payload = serde_json::to_string(record)?;
        self.conn.borrow().execute(
            "INSERT OR REPLACE INTO period_records (station_id, period_type, month, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![record.station_id, record.period_type.as_str(), record.month, payload],
        )?;
        Ok(())
    }

    // ───────────────────── Period Aggregates ─────────────────────

    pub fn query_aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodAggregate>> {
        let conn = self.conn.borrow();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM period_aggregates
                 WHERE station_id = ?1 AND period_type = ?2 AND start_date = ?3 AND end_date = ?4",
                params![
                    station_id,
                    period_type.as_str(),
                    format_date(&range.start()),
                    format_date(&range.end())
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(decode(payload.into_iter().collect())?.pop())
    }

    /// All stored aggregates for a station, ordered by start date and then
    /// period type.
    pub fn query_station_aggregates(
        &self,
        station_id: &str,
    ) -> anyhow::Result<Vec<PeriodAggregate>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT payload FROM period_aggregates WHERE station_id = ?1
             ORDER BY start_date, period_type",
        )?;
        let payloads = stmt
            .query_map(params![station_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        let rows: Vec<PeriodAggregate> = decode(payloads)?;
        log::info!(
            "[CLQC Debug] query: query_station_aggregates {} returned {} records",
            station_id,
            rows.len()
        );
        Ok(rows)
    }

    pub fn store_aggregate(&self, aggregate: &PeriodAggregate) -> anyhow::Result<()> {
        let payload = serde_json::to_string(aggregate)?;
        self.conn.borrow().execute(
            "INSERT OR REPLACE INTO period_aggregates
             (station_id, period_type, start_date, end_date, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                aggregate.station_id,
                aggregate.period_type.as_str(),
                format_date(&aggregate.range.start()),
                format_date(&aggregate.range.end()),
                payload
            ],
        )?;
        Ok(())
    }

    // ───────────────────── Freeze Dates ─────────────────────

    pub fn query_freeze_dates(
        &self,
        station_id: &str,
        season: DateRange,
    ) -> anyhow::Result<Option<FreezeDates>> {
        let conn = self.conn.borrow();
        let row: Option<(Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT early_freeze, late_freeze FROM freeze_dates
                 WHERE station_id = ?1 AND season_start = ?2",
                params![station_id, format_date(&season.start())],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(early, late)| {
            Ok(FreezeDates {
                station_id: station_id.to_string(),
                season,
                early_freeze: parse_optional_date(early)?,
                late_freeze: parse_optional_date(late)?,
            })
        })
        .transpose()
    }

    pub fn query_station_freeze_dates(&self, station_id: &str) -> anyhow::Result<Vec<FreezeDates>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT season_start, season_end, early_freeze, late_freeze FROM freeze_dates
             WHERE station_id = ?1 ORDER BY season_start",
        )?;
        let rows = stmt
            .query_map(params![station_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(start, end, early, late)| {
                Ok(FreezeDates {
                    station_id: station_id.to_string(),
                    season: DateRange(parse_date(&start)?, parse_date(&end)?),
                    early_freeze: parse_optional_date(early)?,
                    late_freeze: parse_optional_date(late)?,
                })
            })
            .collect()
    }

    pub fn store_freeze_dates(&self, dates: &FreezeDates) -> anyhow::Result<()> {
        self.conn.borrow().execute(
            "INSERT OR REPLACE INTO freeze_dates
             (station_id, season_start, season_end, early_freeze, late_freeze)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                dates.station_id,
                format_date(&dates.season.start()),
                format_date(&dates.season.end()),
                dates.early_freeze.as_ref().map(format_date),
                dates.late_freeze.as_ref().map(format_date)
            ],
        )?;
        Ok(())
    }
}
