use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Legacy code for a missing provenance.
pub const QC_MISSING: i32 = -1;
/// Legacy code for an operator-entered value.
pub const QC_MANUAL_ENTRY: i32 = 0;
/// Legacy code for a value taken from the monthly summary message.
pub const QC_VALUE_FROM_MSM: i32 = 1;
/// Legacy code for a value aggregated from daily records.
pub const QC_VALUE_FROM_DAILY: i32 = 2;
/// Highest legacy method code accepted from storage.
pub const QC_UPPER_BOUND: i32 = 18;

/// How a stored field value was produced.
///
/// Persisted as the legacy integer method code, and ordered by it:
/// `Missing < ManualEntry < ValueFromMsm < ValueFromDaily < Computed(_)`.
/// Codes outside `-1..=18` decode to `Missing`.
///
/// ```rust
/// use clqc_core::provenance::FieldProvenance;
///
/// assert!(FieldProvenance::ValueFromDaily.accepts_rebuild());
/// assert!(!FieldProvenance::ManualEntry.accepts_rebuild());
/// assert!(!FieldProvenance::Missing.accepts_rebuild());
/// assert_eq!(FieldProvenance::from_code(2), FieldProvenance::ValueFromDaily);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum FieldProvenance {
    #[default]
    Missing,
    ManualEntry,
    ValueFromMsm,
    ValueFromDaily,
    /// A method-specific computation (daily-derived or better).
    Computed(MethodCode),
}

/// A method-specific computation code, always within `3..=18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodCode(i32);

impl MethodCode {
    pub fn new(code: i32) -> Option<Self> {
        (code > QC_VALUE_FROM_DAILY && code <= QC_UPPER_BOUND).then_some(MethodCode(code))
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl FieldProvenance {
    pub fn from_code(code: i32) -> Self {
        match code {
            QC_MANUAL_ENTRY => FieldProvenance::ManualEntry,
            QC_VALUE_FROM_MSM => FieldProvenance::ValueFromMsm,
            QC_VALUE_FROM_DAILY => FieldProvenance::ValueFromDaily,
            c => MethodCode::new(c).map_or(FieldProvenance::Missing, FieldProvenance::Computed),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            FieldProvenance::Missing => QC_MISSING,
            FieldProvenance::ManualEntry => QC_MANUAL_ENTRY,
            FieldProvenance::ValueFromMsm => QC_VALUE_FROM_MSM,
            FieldProvenance::ValueFromDaily => QC_VALUE_FROM_DAILY,
            FieldProvenance::Computed(c) => c.get(),
        }
    }

    /// Whether a freshly rebuilt value may replace a field carrying this
    /// provenance. Only values known to come from the daily source are
    /// refreshed; operator entries, message-sourced values and fields with
    /// no recorded method are kept.
    pub fn accepts_rebuild(&self) -> bool {
        *self >= FieldProvenance::ValueFromDaily
    }
}

impl PartialOrd for FieldProvenance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldProvenance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

impl From<i32> for FieldProvenance {
    fn from(code: i32) -> Self {
        FieldProvenance::from_code(code)
    }
}

impl From<FieldProvenance> for i32 {
    fn from(provenance: FieldProvenance) -> Self {
        provenance.code()
    }
}

impl fmt::Display for FieldProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProvenance::Missing => write!(f, "MISSING"),
            FieldProvenance::ManualEntry => write!(f, "MANUAL_ENTRY"),
            FieldProvenance::ValueFromMsm => write!(f, "VALUE_FROM_MSM"),
            FieldProvenance::ValueFromDaily => write!(f, "VALUE_FROM_DAILY"),
            FieldProvenance::Computed(c) => write!(f, "COMPUTED({})", c.get()),
        }
    }
}
