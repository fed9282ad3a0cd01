//! The reconciliation engine's view of the store.

use crate::Database;
use chrono::{Datelike, NaiveDate};
use clqc_core::date_range::DateRange;
use clqc_core::freeze::FreezeDates;
use clqc_core::observation::DailyObservation;
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::record::{ExtremeRecord, ExtremeValues, PeriodRecord, RecordValues};
use clqc_data::build::build_period;
use clqc_recon::ClimateService;

impl ClimateService for Database {
    fn fetch_daily_observation(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyObservation>> {
        self.query_daily(station_id, date)
    }

    fn persist_daily_observation(&self, observation: &DailyObservation) -> anyhow::Result<()> {
        self.store_daily(observation)?;
        log::debug!(
            "[CLQC Debug] store: saved daily {} {}",
            observation.station_id,
            observation.date
        );
        Ok(())
    }

    fn fetch_extreme_record(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<ExtremeRecord>> {
        self.query_record_for(station_id, date)
    }

    fn update_extreme_record(
        &self,
        station_id: &str,
        date: NaiveDate,
        extremes: &ExtremeValues,
    ) -> anyhow::Result<()> {
        let mut record = self.query_record_for(station_id, date)?.ok_or_else(|| {
            anyhow::anyhow!(
                "no records row for {} {:02}-{:02}",
                station_id,
                date.month(),
                date.day()
            )
        })?;
        let updated = record.apply(date.year(), extremes);
        self.store_record(&record)?;
        log::info!(
            "[CLQC Debug] store: records {} {:02}-{:02} updated {:?}",
            station_id,
            date.month(),
            date.day(),
            updated
        );
        Ok(())
    }

    fn fetch_period_aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodAggregate>> {
        self.query_aggregate(station_id, period_type, range)
    }

    /// Every period type is rebuilt straight from the daily rows in range.
    fn rebuild_period_aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<PeriodAggregate> {
        let days = self.query_dailies(station_id, range)?;
        Ok(build_period(station_id, period_type, range, &days, &self.thresholds))
    }

    fn persist_period_aggregate(&self, aggregate: &PeriodAggregate) -> anyhow::Result<()> {
        self.store_aggregate(aggregate)?;
        log::debug!(
            "[CLQC Debug] store: saved {} {} {}",
            aggregate.station_id,
            aggregate.period_type,
            aggregate.range
        );
        Ok(())
    }

    fn fetch_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodRecord>> {
        self.query_period_record_for(station_id, period_type, range)
    }

    fn update_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
        extremes: &ExtremeValues,
    ) -> anyhow::Result<()> {
        let month = range.end().month();
        let mut record = self
            .query_period_record(station_id, period_type, month)?
            .ok_or_else(|| {
                anyhow::anyhow!("no {} records row for {} month {}", period_type, station_id, month)
            })?;
        let updated = record.apply(range.end().year(), extremes);
        self.store_period_record(&record)?;
        log::info!(
            "[CLQC Debug] store: {} records {} month {} updated {:?}",
            period_type,
            station_id,
            month,
            updated
        );
        Ok(())
    }

    /// The freeze season containing the station's latest observation.
    fn fetch_current_freeze_season(&self, station_id: &str) -> anyhow::Result<Option<DateRange>> {
        Ok(self
            .query_latest_date(station_id)?
            .and_then(|latest| DateRange::freeze_season_of(&latest)))
    }

    fn redetermine_freeze_dates(
        &self,
        station_id: &str,
        season: DateRange,
    ) -> anyhow::Result<FreezeDates> {
        let (early_freeze, late_freeze) = self.query_freeze_extent(station_id, season)?;
        let dates = FreezeDates {
            station_id: station_id.to_string(),
            season,
            early_freeze,
            late_freeze,
        };
        self.store_freeze_dates(&dates)?;
        log::info!(
            "[CLQC Debug] store: freeze dates {} {} early {:?} late {:?}",
            station_id,
            season,
            early_freeze,
            late_freeze
        );
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use chrono::NaiveDate;
    use clqc_core::period::PeriodType;
    use clqc_core::provenance::FieldProvenance;
    use clqc_core::record::ExtremeKind;
    use clqc_core::settings::ReconSettings;
    use clqc_recon::orchestrator::{CascadeOutcome, RecordStep};
    use clqc_recon::{ClimateService, ReconciliationOrchestrator};

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    /// January 2024 at one station with a hand-entered monthly minimum.
    fn fixture() -> Database {
        let db = Database::new().unwrap();
        db.load_daily_csv(
            "\
station_id,date,max_temp,min_temp,precip
KSEA,2024-01-14,48,33,0.10
KSEA,2024-01-15,50,30,0.25
KSEA,2024-01-16,45,35,T
",
        )
        .unwrap();
        db.load_records_csv(
            "\
station_id,month,day,max_temp,max_temp_years,min_temp,min_temp_years
KSEA,1,15,55,1953,2,1950
",
        )
        .unwrap();
        db.load_aggregates_json(
            r#"[
                {"station_id": "KSEA", "period_type": "monthly",
                 "range": ["2024-01-01", "2024-01-31"],
                 "max_temp": 50, "min_temp": 12, "methods": {"max_temp": 2, "min_temp": 0}},
                {"station_id": "KSEA", "period_type": "annual",
                 "range": ["2024-01-01", "2024-12-31"],
                 "max_temp": 50, "methods": {"max_temp": 2}}
            ]"#,
        )
        .unwrap();
        db.load_period_records_csv(
            "\
station_id,period_type,month,max_temp,max_temp_years,precip,precip_years
KSEA,monthly,1,64,1981,12.92,1953
",
        )
        .unwrap();
        db
    }

    #[test]
    fn rebuild_uses_daily_rows() {
        let db = fixture();
        let range = PeriodType::Monthly.range_for(&jan(15)).unwrap();
        let agg = db.rebuild_period_aggregate("KSEA", PeriodType::Monthly, range).unwrap();
        assert_eq!(agg.max_temp, 50);
        assert_eq!(agg.max_temp_dates, vec![jan(15)]);
        assert_eq!(agg.min_temp, 30);
        assert_eq!(agg.methods.max_temp, FieldProvenance::ValueFromDaily);
    }

    #[test]
    fn update_record_requires_row() {
        let db = fixture();
        let extremes = db.query_daily("KSEA", jan(14)).unwrap().unwrap().extremes();
        assert!(db.update_extreme_record("KSEA", jan(14), &extremes).is_err());
    }

    #[test]
    fn freeze_dates_from_latest_season() {
        let db = fixture();
        let season = db.fetch_current_freeze_season("KSEA").unwrap().unwrap();
        assert_eq!(season.start(), NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        let dates = db.redetermine_freeze_dates("KSEA", season).unwrap();
        assert_eq!(dates.early_freeze, Some(jan(15)));
        assert_eq!(dates.late_freeze, Some(jan(15)));
        assert_eq!(db.query_freeze_dates("KSEA", season).unwrap(), Some(dates));
        assert!(db.fetch_current_freeze_season("KPDX").unwrap().is_none());
    }

    #[test]
    fn save_daily_against_sqlite() {
        let db = fixture();
        let previous = db.query_daily("KSEA", jan(15)).unwrap().unwrap();
        let mut edited = previous.clone();
        edited.max_temp = 55;

        let mut orchestrator =
            ReconciliationOrchestrator::new(&db, |_: &str| true, ReconSettings::default());
        let report = orchestrator.save_daily(&edited, &previous).unwrap();

        let candidates = vec![ExtremeKind::MaxTemp];
        assert_eq!(report.record, RecordStep::Updated { candidates });
        let record = db.query_record("KSEA", 1, 15).unwrap().unwrap();
        assert_eq!(record.max_temp_years, vec![1953, 2024]);

        let month = PeriodType::Monthly.range_for(&jan(15)).unwrap();
        let monthly = db.query_aggregate("KSEA", PeriodType::Monthly, month).unwrap().unwrap();
        assert_eq!(monthly.max_temp, 55);
        assert_eq!(monthly.max_temp_dates, vec![jan(15)]);
        assert_eq!(monthly.methods.max_temp, FieldProvenance::ValueFromDaily);
        // min temp is outside the change and hand-entered
        assert_eq!(monthly.min_temp, 12);

        // no winter aggregate is stored, and none is created
        assert_eq!(report.period(PeriodType::Seasonal).unwrap().outcome, CascadeOutcome::NotFound);
        let season = PeriodType::Seasonal.range_for(&jan(15)).unwrap();
        assert!(db.query_aggregate("KSEA", PeriodType::Seasonal, season).unwrap().is_none());

        let annual = PeriodType::Annual.range_for(&jan(15)).unwrap();
        let stored = db.query_aggregate("KSEA", PeriodType::Annual, annual).unwrap().unwrap();
        assert_eq!(stored.max_temp, 55);

        let saved = db.query_daily("KSEA", jan(15)).unwrap().unwrap();
        assert_eq!(saved.methods.max_temp, FieldProvenance::ManualEntry);
        // daily edits leave the period records alone
        let january = db.query_period_record("KSEA", PeriodType::Monthly, 1).unwrap().unwrap();
        assert_eq!(january.max_temp, 64);
    }

    #[test]
    fn save_period_updates_period_record() {
        let db = fixture();
        let month = PeriodType::Monthly.range_for(&jan(15)).unwrap();
        let previous = db.query_aggregate("KSEA", PeriodType::Monthly, month).unwrap().unwrap();
        let mut edited = previous.clone();
        edited.precip_total = 14.1;

        let mut orchestrator =
            ReconciliationOrchestrator::new(&db, |_: &str| true, ReconSettings::default());
        let report = orchestrator.save_period(&edited, &previous).unwrap();

        let candidates = vec![ExtremeKind::Precip];
        assert_eq!(report.record, RecordStep::Updated { candidates });
        let january = db.query_period_record("KSEA", PeriodType::Monthly, 1).unwrap().unwrap();
        assert_eq!(january.precip, 14.1);
        assert_eq!(january.precip_years, vec![2024]);
        assert_eq!(january.max_temp, 64);
        assert_eq!(january.max_temp_years, vec![1981]);

        // no seasonal row to compare against
        let season = PeriodType::Seasonal.range_for(&jan(15)).unwrap();
        assert!(db.fetch_period_record("KSEA", PeriodType::Seasonal, season).unwrap().is_none());
        let extremes = edited.extremes();
        assert!(db.update_period_record("KSEA", PeriodType::Seasonal, season, &extremes).is_err());
    }
}
