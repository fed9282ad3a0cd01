//! Independent recomputation of period aggregates through the service.

use crate::error::{ReconError, Target};
use crate::service::ClimateService;
use clqc_core::category::ChangeSet;
use clqc_core::date_range::DateRange;
use clqc_core::period::{PeriodAggregate, PeriodType};

/// Requests independent recomputation of period aggregates.
pub struct AggregateRebuilder<'a, S: ClimateService + ?Sized> {
    service: &'a S,
}

impl<'a, S: ClimateService + ?Sized> AggregateRebuilder<'a, S> {
    pub fn new(service: &'a S) -> Self {
        AggregateRebuilder { service }
    }

    /// Rebuild, reporting failure as an error. A rebuild that comes back
    /// with nothing populated counts as a failure too.
    pub fn try_rebuild(
        &self,
        station_id: &str,
        range: DateRange,
        period_type: PeriodType,
        changed: &ChangeSet,
    ) -> Result<PeriodAggregate, ReconError> {
        let target = Target::Period {
            station_id: station_id.to_string(),
            period_type,
            range,
        };
        log::debug!("rebuild: {} for {} changed categories", target, changed.len());
        let rebuilt = self
            .service
            .rebuild_period_aggregate(station_id, period_type, range)
            .map_err(|e| ReconError::rebuild(target.clone(), format!("{:#}", e)))?;
        if rebuilt.is_all_missing() {
            return Err(ReconError::rebuild(target, "rebuild produced no values"));
        }
        Ok(rebuilt)
    }

    /// Rebuild, falling back to an all-missing aggregate on failure.
    /// Callers must not merge an all-missing result.
    pub fn rebuild(
        &self,
        station_id: &str,
        range: DateRange,
        period_type: PeriodType,
        changed: &ChangeSet,
    ) -> PeriodAggregate {
        self.try_rebuild(station_id, range, period_type, changed)
            .unwrap_or_else(|e| {
                log::warn!("{}", e);
                PeriodAggregate::missing(station_id, period_type, range)
            })
    }
}
