//! Product output flags and the coupling rules between them.

use serde::{Deserialize, Serialize};

/// Which columns a climate product prints for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFlags {
    pub measured: bool,
    pub time_of_measured: bool,
    pub norm: bool,
    pub record: bool,
    pub record_year: bool,
    pub departure: bool,
    pub last_year: bool,
    pub date_of_last: bool,
    pub total_month: bool,
    pub total_season: bool,
    pub total_year: bool,
}

/// Resolve dependent flags after a toggle.
///
/// A departure is computed from the normal, so `departure` turns `norm` on;
/// a record year is meaningless without the record, and a date of last
/// occurrence without last year's value. Dependent flags are cleared, the
/// departure rule wins over a cleared `norm`.
pub fn enforce_toggle_invariants(flags: ProductFlags) -> ProductFlags {
    let mut out = flags;
    if out.departure {
        out.norm = true;
    }
    if !out.record {
        out.record_year = false;
    }
    if !out.last_year {
        out.date_of_last = false;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_departure_turns_norm_on() {
        let flags = ProductFlags { departure: true, ..Default::default() };
        let out = enforce_toggle_invariants(flags);
        assert!(out.norm);
        assert!(out.departure);
    }

    #[test]
    fn test_record_year_requires_record() {
        let flags = ProductFlags { record_year: true, ..Default::default() };
        assert!(!enforce_toggle_invariants(flags).record_year);
        let flags = ProductFlags { record: true, record_year: true, ..Default::default() };
        assert!(enforce_toggle_invariants(flags).record_year);
    }

    #[test]
    fn test_date_of_last_requires_last_year() {
        let flags = ProductFlags { date_of_last: true, total_month: true, ..Default::default() };
        let out = enforce_toggle_invariants(flags);
        assert!(!out.date_of_last);
        assert!(out.total_month);
    }

    #[test]
    fn test_consistent_flags_unchanged() {
        let flags = ProductFlags {
            measured: true,
            norm: true,
            departure: true,
            record: true,
            record_year: true,
            ..Default::default()
        };
        assert_eq!(enforce_toggle_invariants(flags), flags);
    }
}
