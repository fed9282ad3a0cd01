//! The `qc-daily`, `qc-period` and `rebuild` commands.

use crate::edit::{apply_edits, Assignment};
use chrono::NaiveDate;
use clqc_core::category::{ChangeCategory, ChangeSet};
use clqc_core::observation::DailyObservation;
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::settings::ReconSettings;
use clqc_db::Database;
use clqc_recon::rebuilder::AggregateRebuilder;
use clqc_recon::{ClimateService, Confirm, ReconciliationOrchestrator, SaveReport};
use std::path::Path;

/// Open the fixture directory as an in-memory store using the configured
/// thresholds.
pub fn open_store(data_dir: &Path, settings: &ReconSettings) -> anyhow::Result<Database> {
    let db = Database::new()?.with_thresholds(settings.thresholds);
    db.load_fixture_dir(data_dir)?;
    Ok(db)
}

/// Edit one day's observation and reconcile everything that depends on it.
///
/// A day with nothing stored starts from an all-missing observation.
pub fn qc_daily<C: Confirm>(
    db: &Database,
    station_id: &str,
    date: NaiveDate,
    edits: &[Assignment],
    settings: ReconSettings,
    confirm: C,
) -> anyhow::Result<SaveReport> {
    let previous = match db.fetch_daily_observation(station_id, date)? {
        Some(previous) => previous,
        None => {
            log::info!(
                "qc-daily: nothing stored for {} {}, starting from missing",
                station_id,
                date
            );
            DailyObservation::missing(station_id, date)
        }
    };
    let edited = apply_edits(&previous, edits)?;
    let mut orchestrator = ReconciliationOrchestrator::new(db, confirm, settings);
    Ok(orchestrator.save_daily(&edited, &previous)?)
}

/// Edit a stored period aggregate directly.
pub fn qc_period<C: Confirm>(
    db: &Database,
    station_id: &str,
    period_type: PeriodType,
    date: NaiveDate,
    edits: &[Assignment],
    settings: ReconSettings,
    confirm: C,
) -> anyhow::Result<SaveReport> {
    let range = period_type
        .range_for(&date)
        .ok_or_else(|| anyhow::anyhow!("no {} period contains {}", period_type, date))?;
    let previous = db
        .fetch_period_aggregate(station_id, period_type, range)?
        .ok_or_else(|| {
            anyhow::anyhow!("no {} aggregate stored for {} {}", period_type, station_id, range)
        })?;
    let edited = apply_edits(&previous, edits)?;
    let mut orchestrator = ReconciliationOrchestrator::new(db, confirm, settings);
    Ok(orchestrator.save_period(&edited, &previous)?)
}

/// Rebuild the aggregate of `period_type` containing `date` from the daily
/// rows, without storing it. A failed rebuild prints as the all-missing
/// aggregate.
pub fn rebuild(
    db: &Database,
    station_id: &str,
    period_type: PeriodType,
    date: NaiveDate,
) -> anyhow::Result<PeriodAggregate> {
    let range = period_type
        .range_for(&date)
        .ok_or_else(|| anyhow::anyhow!("no {} period contains {}", period_type, date))?;
    let everything: ChangeSet = ChangeCategory::ALL.iter().copied().collect();
    Ok(AggregateRebuilder::new(db).rebuild(station_id, range, period_type, &everything))
}

/// Log a one-line summary of what a save did.
pub fn log_summary(report: &SaveReport) {
    let failures = report.failures();
    if failures.is_empty() {
        log::info!(
            "{}: changed {:?}, {} aggregate step(s), no failures",
            report.station_id,
            report.changed_fields,
            report.periods.len()
        );
    } else {
        for failure in failures {
            log::warn!("{}", failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::parse_assignments;
    use clqc_core::provenance::FieldProvenance;
    use clqc_core::record::ExtremeKind;
    use clqc_recon::orchestrator::{CascadeOutcome, RecordStep};

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn store() -> Database {
        let db = Database::new().unwrap();
        db.load_daily_csv(
            "\
station_id,date,max_temp,min_temp,precip
KSEA,2024-01-15,50,30,0.1
KSEA,2024-01-20,44,36,0.3
",
        )
        .unwrap();
        db.load_records_csv("station_id,month,day,max_temp,max_temp_years\nKSEA,1,15,55,1953\n")
            .unwrap();
        db.load_period_records_csv(
            "station_id,period_type,month,max_temp,max_temp_years\nKSEA,monthly,1,52,1990\n",
        )
        .unwrap();
        db.load_aggregates_json(
            r#"[
                {"station_id": "KSEA", "period_type": "monthly",
                 "range": ["2024-01-01", "2024-01-31"],
                 "max_temp": 50, "precip_total": 0.4, "num_precip_ge_01": 1,
                 "methods": {"max_temp": 2, "precip": 1, "precip_ge_01": 2}},
                {"station_id": "KSEA", "period_type": "seasonal",
                 "range": ["2023-12-01", "2024-02-29"],
                 "max_temp": 50, "methods": {"max_temp": 2}}
            ]"#,
        )
        .unwrap();
        db
    }

    fn merged(report: &SaveReport, period_type: PeriodType) -> bool {
        matches!(report.period(period_type).unwrap().outcome, CascadeOutcome::Merged { .. })
    }

    fn edits(args: &[&str]) -> Vec<Assignment> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_assignments(&args).unwrap()
    }

    #[test]
    fn test_qc_daily_declined_season() {
        let db = store();
        // records, monthly, seasonal
        let mut answers = vec![true, true, false].into_iter();
        let confirm = move |_: &str| answers.next().unwrap_or(false);
        let settings = ReconSettings::default();
        let report = qc_daily(&db, "KSEA", jan15(), &edits(&["max_temp=56"]), settings, confirm)
            .unwrap();
        let candidates = vec![ExtremeKind::MaxTemp];
        assert_eq!(report.record, RecordStep::Updated { candidates });
        assert!(merged(&report, PeriodType::Monthly));
        assert_eq!(report.period(PeriodType::Seasonal).unwrap().outcome, CascadeOutcome::Declined);
        assert_eq!(report.period(PeriodType::Annual).unwrap().outcome, CascadeOutcome::NotFound);

        let record = db.query_record("KSEA", 1, 15).unwrap().unwrap();
        assert_eq!(record.max_temp, 56);
        assert_eq!(record.max_temp_years, vec![2024]);
        let season = PeriodType::Seasonal.range_for(&jan15()).unwrap();
        let seasonal = db.query_aggregate("KSEA", PeriodType::Seasonal, season).unwrap();
        assert_eq!(seasonal.unwrap().max_temp, 50);
    }

    #[test]
    fn test_qc_daily_msm_precip_is_kept() {
        let db = store();
        let settings = ReconSettings::default();
        let report =
            qc_daily(&db, "KSEA", jan15(), &edits(&["precip=0.2"]), settings, |_: &str| true)
                .unwrap();
        assert_eq!(report.changed_fields, vec!["precip"]);
        let month = PeriodType::Monthly.range_for(&jan15()).unwrap();
        let monthly = db.query_aggregate("KSEA", PeriodType::Monthly, month).unwrap().unwrap();
        assert_eq!(monthly.precip_total, 0.4);
        assert_eq!(monthly.methods.precip, FieldProvenance::ValueFromMsm);
        // unprotected counts refresh
        assert_eq!(monthly.num_precip_ge_p1, clqc_core::missing::MISSING);
        assert_eq!(monthly.num_precip_ge_01, 2);
    }

    #[test]
    fn test_qc_daily_new_day() {
        let db = store();
        let date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let settings = ReconSettings::default();
        let report =
            qc_daily(&db, "KSEA", date, &edits(&["max_temp=41"]), settings, |_: &str| true)
                .unwrap();
        assert_eq!(report.saved_daily.unwrap().max_temp, 41);
        assert_eq!(report.record, RecordStep::Skipped);
        assert!(db.query_daily("KSEA", date).unwrap().is_some());
    }

    #[test]
    fn test_qc_period_requires_stored_aggregate() {
        let db = store();
        let err = qc_period(
            &db,
            "KSEA",
            PeriodType::Annual,
            jan15(),
            &edits(&["max_temp=60"]),
            ReconSettings::default(),
            |_: &str| true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no annual aggregate"), "{}", err);
    }

    #[test]
    fn test_qc_period_monthly_cascade() {
        let db = store();
        let report = qc_period(
            &db,
            "KSEA",
            PeriodType::Monthly,
            jan15(),
            &edits(&["max_temp=52"]),
            ReconSettings::default(),
            |_: &str| true,
        )
        .unwrap();
        let saved = report.saved_period.as_ref().unwrap();
        assert_eq!(saved.max_temp, 52);
        assert_eq!(saved.methods.max_temp, FieldProvenance::ManualEntry);
        assert!(merged(&report, PeriodType::Seasonal));
        // 52 ties the January record
        let candidates = vec![ExtremeKind::MaxTemp];
        assert_eq!(report.record, RecordStep::Updated { candidates });
        let record = db.query_period_record("KSEA", PeriodType::Monthly, 1).unwrap().unwrap();
        assert_eq!(record.max_temp_years, vec![1990, 2024]);
    }

    #[test]
    fn test_rebuild() {
        let db = store();
        let agg = rebuild(&db, "KSEA", PeriodType::Monthly, jan15()).unwrap();
        assert_eq!(agg.max_temp, 50);
        assert_eq!(agg.num_precip_ge_01, 2);
        let empty = rebuild(&db, "KPDX", PeriodType::Monthly, jan15()).unwrap();
        assert!(empty.is_all_missing());
        assert_eq!(empty.methods.max_temp, FieldProvenance::Missing);
    }
}
