//! In-memory service double for orchestrator tests.

use crate::service::ClimateService;
use chrono::{Datelike, NaiveDate};
use clqc_core::date_range::DateRange;
use clqc_core::freeze::FreezeDates;
use clqc_core::observation::DailyObservation;
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::record::{ExtremeRecord, ExtremeValues, PeriodRecord, RecordValues};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
pub struct MockService {
    pub dailies: RefCell<HashMap<(String, NaiveDate), DailyObservation>>,
    pub records: RefCell<HashMap<(String, u32, u32), ExtremeRecord>>,
    pub aggregates: RefCell<HashMap<(String, PeriodType, DateRange), PeriodAggregate>>,
    pub period_records: RefCell<HashMap<(String, PeriodType, u32), PeriodRecord>>,
    /// What a rebuild returns, per period type. Absent means failure.
    pub rebuilt: HashMap<PeriodType, PeriodAggregate>,
    pub freeze_season: Option<DateRange>,
    pub fail_persist_daily: bool,
    pub fail_fetch_period: Vec<PeriodType>,
    pub fail_persist_period: Vec<PeriodType>,
    pub calls: RefCell<Vec<String>>,
}

impl MockService {
    pub fn put_aggregate(&self, aggregate: PeriodAggregate) {
        self.aggregates.borrow_mut().insert(
            (aggregate.station_id.clone(), aggregate.period_type, aggregate.range),
            aggregate,
        );
    }

    pub fn aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> Option<PeriodAggregate> {
        self.aggregates
            .borrow()
            .get(&(station_id.to_string(), period_type, range))
            .cloned()
    }

    pub fn put_record(&self, record: ExtremeRecord) {
        self.records
            .borrow_mut()
            .insert((record.station_id.clone(), record.month, record.day), record);
    }

    pub fn record(&self, station_id: &str, month: u32, day: u32) -> Option<ExtremeRecord> {
        self.records
            .borrow()
            .get(&(station_id.to_string(), month, day))
            .cloned()
    }

    pub fn put_period_record(&self, record: PeriodRecord) {
        self.period_records.borrow_mut().insert(
            (record.station_id.clone(), record.period_type, record.month),
            record,
        );
    }

    pub fn period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        month: u32,
    ) -> Option<PeriodRecord> {
        self.period_records
            .borrow()
            .get(&(station_id.to_string(), period_type, month))
            .cloned()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl ClimateService for MockService {
    fn fetch_daily_observation(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyObservation>> {
        self.log(format!("fetch_daily {}", date));
        Ok(self.dailies.borrow().get(&(station_id.to_string(), date)).cloned())
    }

    fn persist_daily_observation(&self, observation: &DailyObservation) -> anyhow::Result<()> {
        self.log(format!("persist_daily {}", observation.date));
        if self.fail_persist_daily {
            anyhow::bail!("database unavailable");
        }
        self.dailies
            .borrow_mut()
            .insert((observation.station_id.clone(), observation.date), observation.clone());
        Ok(())
    }

    fn fetch_extreme_record(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<ExtremeRecord>> {
        self.log("fetch_record".to_string());
        Ok(self.record(station_id, date.month(), date.day()))
    }

    fn update_extreme_record(
        &self,
        station_id: &str,
        date: NaiveDate,
        extremes: &ExtremeValues,
    ) -> anyhow::Result<()> {
        self.log("update_record".to_string());
        let mut records = self.records.borrow_mut();
        let record = records
            .get_mut(&(station_id.to_string(), date.month(), date.day()))
            .ok_or_else(|| anyhow::anyhow!("no record row"))?;
        record.apply(date.year(), extremes);
        Ok(())
    }

    fn fetch_period_aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodAggregate>> {
        self.log(format!("fetch_period {}", period_type));
        if self.fail_fetch_period.contains(&period_type) {
            anyhow::bail!("timeout");
        }
        Ok(self.aggregate(station_id, period_type, range))
    }

    fn rebuild_period_aggregate(
        &self,
        _station_id: &str,
        period_type: PeriodType,
        _range: DateRange,
    ) -> anyhow::Result<PeriodAggregate> {
        self.log(format!("rebuild {}", period_type));
        self.rebuilt
            .get(&period_type)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("daily source unavailable"))
    }

    fn persist_period_aggregate(&self, aggregate: &PeriodAggregate) -> anyhow::Result<()> {
        self.log(format!("persist_period {}", aggregate.period_type));
        if self.fail_persist_period.contains(&aggregate.period_type) {
            anyhow::bail!("constraint violation");
        }
        self.put_aggregate(aggregate.clone());
        Ok(())
    }

    fn fetch_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodRecord>> {
        self.log(format!("fetch_period_record {}", period_type));
        Ok(self.period_record(station_id, period_type, range.end().month()))
    }

    fn update_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
        extremes: &ExtremeValues,
    ) -> anyhow::Result<()> {
        self.log(format!("update_period_record {}", period_type));
        let mut records = self.period_records.borrow_mut();
        let record = records
            .get_mut(&(station_id.to_string(), period_type, range.end().month()))
            .ok_or_else(|| anyhow::anyhow!("no period record row"))?;
        record.apply(range.end().year(), extremes);
        Ok(())
    }

    fn fetch_current_freeze_season(&self, _station_id: &str) -> anyhow::Result<Option<DateRange>> {
        self.log("fetch_freeze_season".to_string());
        Ok(self.freeze_season)
    }

    fn redetermine_freeze_dates(
        &self,
        station_id: &str,
        season: DateRange,
    ) -> anyhow::Result<FreezeDates> {
        self.log("redetermine_freeze".to_string());
        Ok(FreezeDates {
            station_id: station_id.to_string(),
            season,
            early_freeze: None,
            late_freeze: None,
        })
    }
}
