//! Drives a save from the edited record through records, freeze dates and
//! the period aggregates that overlap it.

use crate::comparator::{self, RecordCheck};
use crate::error::{ReconError, Target};
use crate::fields::{merge_aggregate, MergeSummary};
use crate::rebuilder::AggregateRebuilder;
use crate::service::{ClimateService, Confirm};
use crate::tracker;
use chrono::NaiveDate;
use clqc_core::category::{ChangeCategory, ChangeSet};
use clqc_core::date_range::DateRange;
use clqc_core::freeze::FreezeDates;
use clqc_core::observation::DailyObservation;
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::record::{ExtremeKind, ExtremeValues, RecordValues};
use clqc_core::settings::ReconSettings;
use serde::Serialize;

/// Asked once when any edited extreme sets or ties its record.
pub const RECORDS_PROMPT: &str = concat!(
    "New value(s) might set or tie record(s) in historical database.\n",
    "Is it OK to update record(s)?"
);

/// Periods a daily edit cascades into, in order.
pub const DAILY_CASCADE: [PeriodType; 3] =
    [PeriodType::Monthly, PeriodType::Seasonal, PeriodType::Annual];

/// Periods a monthly edit cascades into, in order.
pub const MONTHLY_CASCADE: [PeriodType; 2] = [PeriodType::Seasonal, PeriodType::Annual];

/// Asked before each stored aggregate is refreshed.
pub fn cascade_prompt(period_type: PeriodType) -> String {
    format!("Is it OK to update the {} record for this date?", period_type)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SaveState {
    Idle,
    PersistingDaily,
    PersistingPeriod,
    RecordCheck,
    CascadePrompt(PeriodType),
    Merging(PeriodType),
    PersistingAggregate(PeriodType),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordStep {
    /// No extreme changed, so records were not consulted.
    NotChecked,
    /// No records row for this station and calendar day or period.
    Skipped,
    NoChange,
    Declined { candidates: Vec<ExtremeKind> },
    Updated { candidates: Vec<ExtremeKind> },
    Failed { error: ReconError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FreezeStep {
    OutsideCurrentSeason,
    Redetermined { dates: FreezeDates },
    Failed { error: ReconError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CascadeOutcome {
    /// No aggregate is stored for the period; none is created.
    NotFound,
    Declined,
    /// Every affected field was protected, nothing was written.
    Unchanged { summary: MergeSummary },
    Merged { summary: MergeSummary },
    Failed { error: ReconError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStep {
    pub period_type: PeriodType,
    pub range: DateRange,
    pub outcome: CascadeOutcome,
}

/// Everything one save did, step by step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub station_id: String,
    pub changed: ChangeSet,
    pub changed_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_daily: Option<DailyObservation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_period: Option<PeriodAggregate>,
    pub record: RecordStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeze: Option<FreezeStep>,
    pub periods: Vec<PeriodStep>,
    pub states: Vec<SaveState>,
}

impl SaveReport {
    pub fn period(&self, period_type: PeriodType) -> Option<&PeriodStep> {
        self.periods.iter().find(|p| p.period_type == period_type)
    }

    /// Isolated failures, in the order they happened.
    pub fn failures(&self) -> Vec<&ReconError> {
        let mut out = Vec::new();
        if let RecordStep::Failed { error } = &self.record {
            out.push(error);
        }
        if let Some(FreezeStep::Failed { error }) = &self.freeze {
            out.push(error);
        }
        for step in &self.periods {
            if let CascadeOutcome::Failed { error } = &step.outcome {
                out.push(error);
            }
        }
        out
    }
}

/// Saves edited records and reconciles everything derived from them.
///
/// One save runs at a time; every interaction with the store is a
/// synchronous request, and every confirmation blocks until answered.
pub struct ReconciliationOrchestrator<'a, S: ClimateService + ?Sized, C: Confirm> {
    service: &'a S,
    confirm: C,
    settings: ReconSettings,
    state: SaveState,
    visited: Vec<SaveState>,
}

impl<'a, S: ClimateService + ?Sized, C: Confirm> ReconciliationOrchestrator<'a, S, C> {
    pub fn new(service: &'a S, confirm: C, settings: ReconSettings) -> Self {
        ReconciliationOrchestrator {
            service,
            confirm,
            settings,
            state: SaveState::Idle,
            visited: Vec::new(),
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn into_confirm(self) -> C {
        self.confirm
    }

    fn enter(&mut self, state: SaveState) {
        log::debug!("reconcile: {:?} -> {:?}", self.state, state);
        self.state = state;
        self.visited.push(state);
    }

    fn begin(&mut self) {
        self.state = SaveState::Idle;
        self.visited = vec![SaveState::Idle];
    }

    /// Save an edited daily observation and reconcile what depends on it.
    ///
    /// The observation is persisted first, with changed governed fields
    /// stamped as manual entries and derived fields recomputed. Failing to
    /// persist it is the only error returned; later failures are isolated
    /// and listed in the report.
    pub fn save_daily(
        &mut self,
        edited: &DailyObservation,
        previous: &DailyObservation,
    ) -> Result<SaveReport, ReconError> {
        self.begin();
        let changed = tracker::diff(previous, edited);
        let changed_fields = tracker::changed_daily_fields(previous, edited);
        let mut saved = tracker::stamp_manual_entries(previous, edited);
        tracker::derive_daily_fields(&mut saved);
        log::info!(
            "save_daily: {} {} changed fields {:?}",
            saved.station_id,
            saved.date,
            changed_fields
        );

        self.enter(SaveState::PersistingDaily);
        if let Err(e) = self.service.persist_daily_observation(&saved) {
            let err = ReconError::persist(
                Target::Daily {
                    station_id: saved.station_id.clone(),
                    date: saved.date,
                },
                &e,
            );
            log::error!("{}", err);
            self.enter(SaveState::Idle);
            return Err(err);
        }

        let record = self.check_records(&saved, &changed);
        let freeze = self.refresh_freeze_dates(&saved, &changed);
        let periods = if changed.is_empty() {
            log::info!("save_daily: nothing changed, no aggregates to refresh");
            Vec::new()
        } else {
            self.cascade(&saved.station_id, saved.date, &DAILY_CASCADE, &changed)
        };
        self.enter(SaveState::Idle);

        Ok(SaveReport {
            station_id: saved.station_id.clone(),
            changed,
            changed_fields,
            saved_daily: Some(saved),
            saved_period: None,
            record,
            freeze,
            periods,
            states: std::mem::take(&mut self.visited),
        })
    }

    /// Save a directly edited period aggregate and check its extremes
    /// against the period records. A monthly edit then refreshes the
    /// seasonal and annual aggregates that contain it.
    pub fn save_period(
        &mut self,
        edited: &PeriodAggregate,
        previous: &PeriodAggregate,
    ) -> Result<SaveReport, ReconError> {
        self.begin();
        let changed = tracker::diff_period(previous, edited);
        let changed_fields = tracker::changed_period_fields(previous, edited);
        let saved = tracker::stamp_period_manual_entries(previous, edited);
        log::info!(
            "save_period: {} {} {} changed fields {:?}",
            saved.station_id,
            saved.period_type,
            saved.range,
            changed_fields
        );

        self.enter(SaveState::PersistingPeriod);
        if let Err(e) = self.service.persist_period_aggregate(&saved) {
            let err = ReconError::persist(
                Target::Period {
                    station_id: saved.station_id.clone(),
                    period_type: saved.period_type,
                    range: saved.range,
                },
                &e,
            );
            log::error!("{}", err);
            self.enter(SaveState::Idle);
            return Err(err);
        }

        let record = self.check_period_records(&saved, &changed);
        let periods = if saved.period_type == PeriodType::Monthly && !changed.is_empty() {
            self.cascade(&saved.station_id, saved.range.start(), &MONTHLY_CASCADE, &changed)
        } else {
            Vec::new()
        };
        self.enter(SaveState::Idle);

        Ok(SaveReport {
            station_id: saved.station_id.clone(),
            changed,
            changed_fields,
            saved_daily: None,
            saved_period: Some(saved),
            record,
            freeze: None,
            periods,
            states: std::mem::take(&mut self.visited),
        })
    }

    fn check_records(&mut self, saved: &DailyObservation, changed: &ChangeSet) -> RecordStep {
        let service = self.service;
        let (station_id, date) = (saved.station_id.as_str(), saved.date);
        let extremes = saved.extremes();
        self.resolve_records(
            Target::Record {
                station_id: station_id.to_string(),
                date,
            },
            &extremes,
            changed,
            || service.fetch_extreme_record(station_id, date),
            || service.update_extreme_record(station_id, date, &extremes),
        )
    }

    fn check_period_records(&mut self, saved: &PeriodAggregate, changed: &ChangeSet) -> RecordStep {
        let service = self.service;
        let (station_id, period_type, range) =
            (saved.station_id.as_str(), saved.period_type, saved.range);
        let extremes = saved.extremes();
        self.resolve_records(
            Target::PeriodRecord {
                station_id: station_id.to_string(),
                period_type,
                range,
            },
            &extremes,
            changed,
            || service.fetch_period_record(station_id, period_type, range),
            || service.update_period_record(station_id, period_type, range, &extremes),
        )
    }

    /// Compare `extremes` with the record `fetch` returns and, once the
    /// operator confirms, fold them in through `update`.
    fn resolve_records<R: RecordValues>(
        &mut self,
        target: Target,
        extremes: &ExtremeValues,
        changed: &ChangeSet,
        fetch: impl FnOnce() -> anyhow::Result<Option<R>>,
        update: impl FnOnce() -> anyhow::Result<()>,
    ) -> RecordStep {
        if !comparator::touches_extremes(changed) {
            return RecordStep::NotChecked;
        }
        self.enter(SaveState::RecordCheck);
        let record = match fetch() {
            Ok(record) => record,
            Err(e) => {
                let error = ReconError::fetch(target, &e);
                log::warn!("{}", error);
                return RecordStep::Failed { error };
            }
        };
        match comparator::check_extremes(extremes, record.as_ref(), changed) {
            RecordCheck::Skipped => {
                log::info!("records: no row for {}, check skipped", target);
                RecordStep::Skipped
            }
            RecordCheck::NoChange => RecordStep::NoChange,
            RecordCheck::Candidates(candidates) => {
                if !self.confirm.confirm(RECORDS_PROMPT) {
                    log::info!("records: update of {:?} declined", candidates);
                    return RecordStep::Declined { candidates };
                }
                match update() {
                    Ok(()) => {
                        log::info!("records: updated {:?} for {}", candidates, target);
                        RecordStep::Updated { candidates }
                    }
                    Err(e) => {
                        let error = ReconError::persist(target, &e);
                        log::warn!("{}", error);
                        RecordStep::Failed { error }
                    }
                }
            }
        }
    }

    fn refresh_freeze_dates(
        &mut self,
        saved: &DailyObservation,
        changed: &ChangeSet,
    ) -> Option<FreezeStep> {
        if !self.settings.redetermine_freeze_dates || !changed.contains(&ChangeCategory::MinTemp) {
            return None;
        }
        let station_id = saved.station_id.as_str();
        let season = match self.service.fetch_current_freeze_season(station_id) {
            Ok(Some(season)) if season.contains(&saved.date) => season,
            Ok(_) => return Some(FreezeStep::OutsideCurrentSeason),
            Err(e) => {
                let season = DateRange::freeze_season_of(&saved.date)
                    .unwrap_or(DateRange(saved.date, saved.date));
                let error = ReconError::fetch(
                    Target::FreezeSeason {
                        station_id: station_id.to_string(),
                        season,
                    },
                    &e,
                );
                log::warn!("{}", error);
                return Some(FreezeStep::Failed { error });
            }
        };
        match self.service.redetermine_freeze_dates(station_id, season) {
            Ok(dates) => {
                log::info!("freeze: redetermined {} {}", station_id, season);
                Some(FreezeStep::Redetermined { dates })
            }
            Err(e) => {
                let error = ReconError::persist(
                    Target::FreezeSeason {
                        station_id: station_id.to_string(),
                        season,
                    },
                    &e,
                );
                log::warn!("{}", error);
                Some(FreezeStep::Failed { error })
            }
        }
    }

    fn cascade(
        &mut self,
        station_id: &str,
        anchor: NaiveDate,
        periods: &[PeriodType],
        changed: &ChangeSet,
    ) -> Vec<PeriodStep> {
        let mut steps = Vec::with_capacity(periods.len());
        for &period_type in periods {
            let Some(range) = period_type.range_for(&anchor) else {
                log::warn!("cascade: no {} period contains {}", period_type, anchor);
                continue;
            };
            let outcome = self.cascade_one(station_id, period_type, range, changed);
            steps.push(PeriodStep {
                period_type,
                range,
                outcome,
            });
        }
        steps
    }

    fn cascade_one(
        &mut self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
        changed: &ChangeSet,
    ) -> CascadeOutcome {
        let target = Target::Period {
            station_id: station_id.to_string(),
            period_type,
            range,
        };
        self.enter(SaveState::CascadePrompt(period_type));
        let existing = match self.service.fetch_period_aggregate(station_id, period_type, range) {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                log::info!("cascade: {} not stored, skipping", target);
                return CascadeOutcome::NotFound;
            }
            Err(e) => {
                let error = ReconError::fetch(target, &e);
                log::warn!("{}", error);
                return CascadeOutcome::Failed { error };
            }
        };
        if !self.confirm.confirm(&cascade_prompt(period_type)) {
            log::info!("cascade: update of {} declined", target);
            return CascadeOutcome::Declined;
        }

        self.enter(SaveState::Merging(period_type));
        let rebuilder = AggregateRebuilder::new(self.service);
        let rebuilt = match rebuilder.try_rebuild(station_id, range, period_type, changed) {
            Ok(rebuilt) => rebuilt,
            Err(error) => {
                log::warn!("{}", error);
                return CascadeOutcome::Failed { error };
            }
        };
        let (merged, summary) = merge_aggregate(&existing, &rebuilt, changed);
        if summary.replaced.is_empty() {
            log::info!("cascade: {} fully protected, nothing to write", target);
            return CascadeOutcome::Unchanged { summary };
        }

        self.enter(SaveState::PersistingAggregate(period_type));
        match self.service.persist_period_aggregate(&merged) {
            Ok(()) => {
                log::info!(
                    "cascade: {} replaced {:?}, protected {:?}",
                    target,
                    summary.replaced,
                    summary.protected
                );
                CascadeOutcome::Merged { summary }
            }
            Err(e) => {
                let error = ReconError::persist(target, &e);
                log::warn!("{}", error);
                CascadeOutcome::Failed { error }
            }
        }
    }
}
