//! Missing-value sentinels and sentinel-aware equality.
//!
//! Stored climate values never use `Option`: every quantity type has a
//! sentinel meaning "no value". Precipitation and snowfall additionally
//! carry a trace sentinel for amounts too small to measure.

/// Missing integer value (temperatures, humidity, directions, counts).
pub const MISSING: i32 = 9999;

/// Missing precipitation amount.
pub const MISSING_PRECIP: f32 = 9999.0;

/// Missing snowfall or snow depth.
pub const MISSING_SNOW: f32 = 9999.0;

/// Missing wind speed.
pub const MISSING_SPEED: f32 = 9999.0;

/// Missing sky cover fraction.
pub const MISSING_SKY: f32 = 9999.0;

/// Missing sea-level pressure.
pub const MISSING_SLP: f64 = 9999.0;

/// Missing heating or cooling degree days.
pub const MISSING_DEGREE_DAY: i32 = 9999;

/// Trace precipitation or snowfall, shown as "T" on forms.
pub const TRACE: f32 = -1.0;

/// Tolerance for floating point equality.
pub const EPSILON: f64 = 0.00001;

/// Float equality within [`EPSILON`].
pub fn floating_equals(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Whether a trace sentinel is stored in `value`.
pub fn is_trace(value: f32) -> bool {
    floating_equals(value as f64, TRACE as f64)
}

/// A stored quantity that has a missing sentinel.
pub trait Sentinel {
    fn is_missing(&self) -> bool;
}

impl Sentinel for i32 {
    fn is_missing(&self) -> bool {
        *self == MISSING
    }
}

impl Sentinel for f32 {
    fn is_missing(&self) -> bool {
        floating_equals(*self as f64, MISSING_PRECIP as f64)
    }
}

impl Sentinel for f64 {
    fn is_missing(&self) -> bool {
        floating_equals(*self, MISSING_SLP)
    }
}

/// Equality as the persistence layer sees it: floats compare within
/// [`EPSILON`] and two missing sentinels are always equal.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

impl SameValue for i32 {
    fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

impl SameValue for f32 {
    fn same_value(&self, other: &Self) -> bool {
        (self.is_missing() && other.is_missing()) || floating_equals(*self as f64, *other as f64)
    }
}

impl SameValue for f64 {
    fn same_value(&self, other: &Self) -> bool {
        (self.is_missing() && other.is_missing()) || floating_equals(*self, *other)
    }
}

impl SameValue for chrono::NaiveDate {
    fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: SameValue> SameValue for Vec<T> {
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

impl<T: SameValue, const N: usize> SameValue for [T; N] {
    fn same_value(&self, other: &Self) -> bool {
        self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

impl SameValue for bool {
    fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sentinels() {
        assert!(MISSING.is_missing());
        assert!(!55_i32.is_missing());
        assert!(MISSING_PRECIP.is_missing());
        assert!(9999.000001_f32.is_missing());
        assert!(!TRACE.is_missing());
        assert!(MISSING_SLP.is_missing());
    }

    #[test]
    fn test_same_value_floats() {
        assert!(0.1_f32.same_value(&0.100001));
        assert!(!0.1_f32.same_value(&0.11));
        assert!(MISSING_PRECIP.same_value(&9999.000001));
        assert!(is_trace(-1.0));
        assert!(!is_trace(0.0));
    }

    #[test]
    fn test_same_value_collections() {
        assert!(vec![1_i32, 2].same_value(&vec![1, 2]));
        assert!(!vec![1_i32, 2].same_value(&vec![1]));
        assert!([true, false].same_value(&[true, false]));
        assert!(![true, false].same_value(&[true, true]));
    }
}
