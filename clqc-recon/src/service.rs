//! The persistence boundary and the confirmation hook.

use chrono::NaiveDate;
use clqc_core::date_range::DateRange;
use clqc_core::freeze::FreezeDates;
use clqc_core::observation::DailyObservation;
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::record::{ExtremeRecord, ExtremeValues, PeriodRecord};

/// Request/response operations against the climate database.
///
/// Implementations are synchronous; each call either completes or fails
/// with a descriptive error. Nothing is retried by the caller.
pub trait ClimateService {
    fn fetch_daily_observation(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyObservation>>;

    fn persist_daily_observation(&self, observation: &DailyObservation) -> anyhow::Result<()>;

    /// Historical extremes for the calendar day of `date`.
    fn fetch_extreme_record(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<ExtremeRecord>>;

    /// Fold the day's values into the historical record for its calendar
    /// day, crediting the year of `date`.
    fn update_extreme_record(
        &self,
        station_id: &str,
        date: NaiveDate,
        extremes: &ExtremeValues,
    ) -> anyhow::Result<()>;

    fn fetch_period_aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodAggregate>>;

    /// Recompute an aggregate from its daily source without storing it.
    fn rebuild_period_aggregate(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<PeriodAggregate>;

    fn persist_period_aggregate(&self, aggregate: &PeriodAggregate) -> anyhow::Result<()>;

    /// Historical extremes for the period type and the month `range` ends in.
    fn fetch_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
    ) -> anyhow::Result<Option<PeriodRecord>>;

    /// Fold a period's extremes into its period record, crediting the year
    /// the period ends in.
    fn update_period_record(
        &self,
        station_id: &str,
        period_type: PeriodType,
        range: DateRange,
        extremes: &ExtremeValues,
    ) -> anyhow::Result<()>;

    /// The freeze season currently being tracked for the station, if any.
    fn fetch_current_freeze_season(&self, station_id: &str) -> anyhow::Result<Option<DateRange>>;

    /// Recompute and store first/last freeze dates for a season.
    fn redetermine_freeze_dates(
        &self,
        station_id: &str,
        season: DateRange,
    ) -> anyhow::Result<FreezeDates>;
}

/// Asks the operator a yes/no question. `false` skips the guarded step.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}
