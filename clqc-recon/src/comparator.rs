//! Compares edited extremes with the historical records table.
//!
//! Comparison never mutates anything; updating the record is a separate,
//! confirmed step driven by the orchestrator.

use clqc_core::category::ChangeSet;
use clqc_core::record::{amount_rank, ExtremeKind, ExtremeValues, RecordValues};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordOutcome {
    NoChange,
    NewOrTiedRecord,
}

/// Outcome of checking edited values against their records row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RecordCheck {
    /// No records row exists for the station and day or period.
    Skipped,
    NoChange,
    /// These extremes would set or tie their record.
    Candidates(Vec<ExtremeKind>),
}

/// Compare one value with its record. `None` stands for a missing value
/// on either side and never triggers.
///
/// ```rust
/// use clqc_recon::comparator::{check_value, RecordOutcome};
///
/// assert_eq!(check_value(Some(55.0), Some(55.0), true), RecordOutcome::NewOrTiedRecord);
/// assert_eq!(check_value(Some(54.0), Some(55.0), true), RecordOutcome::NoChange);
/// assert_eq!(check_value(None, Some(55.0), true), RecordOutcome::NoChange);
/// ```
pub fn check_value(edited: Option<f64>, record: Option<f64>, is_max: bool) -> RecordOutcome {
    let (Some(edited), Some(record)) = (edited, record) else {
        return RecordOutcome::NoChange;
    };
    let reaches = if is_max {
        edited >= record
    } else {
        edited <= record
    };
    if reaches {
        RecordOutcome::NewOrTiedRecord
    } else {
        RecordOutcome::NoChange
    }
}

/// Check one edited extreme against the stored record.
///
/// Precipitation and snowfall of zero never reach a record; a trace ranks
/// just above zero so it only reaches a stored zero or trace.
pub fn check_record<R: RecordValues>(
    kind: ExtremeKind,
    edited: &ExtremeValues,
    record: &R,
) -> RecordOutcome {
    let edited_value = edited.value(kind);
    let record_value = record.value(kind);
    if kind.is_amount() {
        if edited_value == Some(0.0) {
            return RecordOutcome::NoChange;
        }
        check_value(
            edited_value.map(amount_rank),
            record_value.map(amount_rank),
            kind.is_max(),
        )
    } else {
        check_value(edited_value, record_value, kind.is_max())
    }
}

/// Check every extreme whose category changed.
pub fn check_extremes<R: RecordValues>(
    edited: &ExtremeValues,
    record: Option<&R>,
    changed: &ChangeSet,
) -> RecordCheck {
    let Some(record) = record else {
        return RecordCheck::Skipped;
    };
    let candidates: Vec<ExtremeKind> = ExtremeKind::ALL
        .iter()
        .copied()
        .filter(|k| changed.contains(&k.category()))
        .filter(|k| check_record(*k, edited, record) == RecordOutcome::NewOrTiedRecord)
        .collect();
    if candidates.is_empty() {
        RecordCheck::NoChange
    } else {
        RecordCheck::Candidates(candidates)
    }
}

/// Whether any extreme category is in the change set at all.
pub fn touches_extremes(changed: &ChangeSet) -> bool {
    ExtremeKind::ALL.iter().any(|k| changed.contains(&k.category()))
}
