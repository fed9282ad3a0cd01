//! Period statistics computed from daily climate observations.
//!
//! This crate turns the daily rows of a month, season or year into a
//! [`PeriodAggregate`](clqc_core::period::PeriodAggregate). It is what a
//! store runs when asked to rebuild an aggregate from its daily source.

pub mod build;

/// Small numeric helpers shared by the builders.
pub mod stats {
    use chrono::NaiveDate;

    /// Most dates listed for a tied extreme.
    pub const MAX_EXTREME_DATES: usize = 3;

    /// Arithmetic mean, `None` for an empty input.
    pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let (sum, n) = values
            .into_iter()
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }

    /// Round to `places` decimal places.
    pub fn round_to(value: f64, places: i32) -> f64 {
        let factor = 10f64.powi(places);
        (value * factor).round() / factor
    }

    /// The most extreme value by `rank` and the dates (up to
    /// [`MAX_EXTREME_DATES`], earliest first) on which it occurred.
    pub fn extreme_by<T: Copy>(
        values: &[(NaiveDate, T)],
        rank: impl Fn(T) -> f64,
        is_max: bool,
    ) -> Option<(T, Vec<NaiveDate>)> {
        let mut best: Option<(T, f64)> = None;
        for (_, v) in values {
            let r = rank(*v);
            let better = match best {
                None => true,
                Some((_, b)) => {
                    if is_max {
                        r > b
                    } else {
                        r < b
                    }
                }
            };
            if better {
                best = Some((*v, r));
            }
        }
        let (value, best_rank) = best?;
        let mut dates: Vec<NaiveDate> = values
            .iter()
            .filter(|(_, v)| (rank(*v) - best_rank).abs() < clqc_core::missing::EPSILON)
            .map(|(d, _)| *d)
            .collect();
        dates.sort();
        dates.truncate(MAX_EXTREME_DATES);
        Some((value, dates))
    }

}
