//! Error taxonomy for reconciliation steps.

use chrono::NaiveDate;
use clqc_core::date_range::DateRange;
use clqc_core::period::PeriodType;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The stored entity a failed step was working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Daily {
        station_id: String,
        date: NaiveDate,
    },
    Record {
        station_id: String,
        date: NaiveDate,
    },
    Period {
        station_id: String,
        period_type: PeriodType,
        range: DateRange,
    },
    PeriodRecord {
        station_id: String,
        period_type: PeriodType,
        range: DateRange,
    },
    FreezeSeason {
        station_id: String,
        season: DateRange,
    },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Daily { station_id, date } => write!(f, "daily {} {}", station_id, date),
            Target::Record { station_id, date } => {
                write!(f, "record {} {}", station_id, date.format("%m-%d"))
            }
            Target::Period {
                station_id,
                period_type,
                range,
            } => write!(f, "{} {} {}", period_type, station_id, range),
            Target::PeriodRecord {
                station_id,
                period_type,
                range,
            } => write!(f, "{} record {} {}", period_type, station_id, range.end().format("%m")),
            Target::FreezeSeason { station_id, season } => {
                write!(f, "freeze season {} {}", station_id, season)
            }
        }
    }
}

/// A failed persistence-layer interaction.
///
/// Only a failed daily save aborts a reconciliation; every other failure is
/// isolated to its step and reported alongside the successful ones.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ReconError {
    #[error("Fetch failed for {target}: {detail}")]
    FetchFailure { target: Target, detail: String },

    #[error("Persist failed for {target}: {detail}")]
    PersistFailure { target: Target, detail: String },

    #[error("Rebuild failed for {target}: {detail}")]
    RebuildFailure { target: Target, detail: String },
}

impl ReconError {
    pub fn fetch(target: Target, err: &anyhow::Error) -> Self {
        ReconError::FetchFailure {
            target,
            detail: format!("{:#}", err),
        }
    }

    pub fn persist(target: Target, err: &anyhow::Error) -> Self {
        ReconError::PersistFailure {
            target,
            detail: format!("{:#}", err),
        }
    }

    pub fn rebuild(target: Target, detail: impl Into<String>) -> Self {
        ReconError::RebuildFailure {
            target,
            detail: detail.into(),
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            ReconError::FetchFailure { target, .. }
            | ReconError::PersistFailure { target, .. }
            | ReconError::RebuildFailure { target, .. } => target,
        }
    }
}
