use crate::missing::{
    SameValue, Sentinel, MISSING, MISSING_DEGREE_DAY, MISSING_PRECIP, MISSING_SKY, MISSING_SLP,
    MISSING_SNOW, MISSING_SPEED,
};
use crate::provenance::FieldProvenance;
use crate::record::ExtremeValues;
use crate::weather::WeatherFlags;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Base temperature (°F) for heating and cooling degree days.
pub const DEGREE_DAY_BASE: f64 = 65.0;

/// A wind reading: direction in degrees and speed in mph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub dir: i32,
    pub speed: f32,
}

impl Wind {
    pub fn new(dir: i32, speed: f32) -> Self {
        Wind { dir, speed }
    }

    pub fn missing() -> Self {
        Wind {
            dir: MISSING,
            speed: MISSING_SPEED,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.speed.is_missing()
    }
}

impl Default for Wind {
    fn default() -> Self {
        Wind::missing()
    }
}

impl SameValue for Wind {
    fn same_value(&self, other: &Self) -> bool {
        self.dir == other.dir && self.speed.same_value(&other.speed)
    }
}

/// Provenance of the governed fields of a [`DailyObservation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyDataMethods {
    pub max_temp: FieldProvenance,
    pub min_temp: FieldProvenance,
    pub precip: FieldProvenance,
    pub snow: FieldProvenance,
    pub depth: FieldProvenance,
    pub max_wind: FieldProvenance,
    pub max_gust: FieldProvenance,
    pub avg_wind: FieldProvenance,
    pub min_sun: FieldProvenance,
    pub poss_sun: FieldProvenance,
    pub sky_cover: FieldProvenance,
    pub weather: FieldProvenance,
}

/// One station's observations for one day.
///
/// Quantities without a value hold the sentinel for their type (see
/// [`crate::missing`]); `num_wx`, `num_heat` and `num_cool` are derived and
/// refreshed with [`DailyObservation::refresh_derived`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub station_id: String,
    pub date: NaiveDate,
    pub max_temp: i32,
    pub min_temp: i32,
    pub max_rel_humid: i32,
    pub min_rel_humid: i32,
    pub max_wind: Wind,
    pub max_gust: Wind,
    pub result_wind: Wind,
    pub avg_wind_speed: f32,
    pub precip: f32,
    pub snow_day: f32,
    pub snow_ground: f32,
    pub minutes_sun: i32,
    pub percent_poss_sun: i32,
    pub sky_cover: f32,
    pub max_slp: f64,
    pub min_slp: f64,
    pub weather: WeatherFlags,
    pub num_wx: i32,
    pub num_heat: i32,
    pub num_cool: i32,
    pub methods: DailyDataMethods,
}

impl DailyObservation {
    /// An observation with every quantity missing.
    pub fn missing(station_id: &str, date: NaiveDate) -> Self {
        DailyObservation {
            station_id: station_id.to_string(),
            date,
            max_temp: MISSING,
            min_temp: MISSING,
            max_rel_humid: MISSING,
            min_rel_humid: MISSING,
            max_wind: Wind::missing(),
            max_gust: Wind::missing(),
            result_wind: Wind::missing(),
            avg_wind_speed: MISSING_SPEED,
            precip: MISSING_PRECIP,
            snow_day: MISSING_SNOW,
            snow_ground: MISSING_SNOW,
            minutes_sun: MISSING,
            percent_poss_sun: MISSING,
            sky_cover: MISSING_SKY,
            max_slp: MISSING_SLP,
            min_slp: MISSING_SLP,
            weather: WeatherFlags::default(),
            num_wx: 0,
            num_heat: MISSING_DEGREE_DAY,
            num_cool: MISSING_DEGREE_DAY,
            methods: DailyDataMethods::default(),
        }
    }

    /// Recompute the phenomena count and degree days from the stored values.
    pub fn refresh_derived(&mut self) {
        self.num_wx = self.weather.count();
        let (heat, cool) = degree_days(self.max_temp, self.min_temp);
        self.num_heat = heat;
        self.num_cool = cool;
    }

    /// The values that are compared against the historical records table.
    pub fn extremes(&self) -> ExtremeValues {
        ExtremeValues {
            max_temp: self.max_temp,
            min_temp: self.min_temp,
            precip: self.precip,
            snow: self.snow_day,
        }
    }
}

/// Heating and cooling degree days for a day's max/min temperature.
///
/// Both are missing if either temperature is missing. The daily average is
/// rounded before the difference from the base is taken.
pub fn degree_days(max_temp: i32, min_temp: i32) -> (i32, i32) {
    if max_temp.is_missing() || min_temp.is_missing() {
        return (MISSING_DEGREE_DAY, MISSING_DEGREE_DAY);
    }
    let avg = (max_temp + min_temp) as f64 / 2.0;
    let rounded = avg.round() as i32;
    let base = DEGREE_DAY_BASE as i32;
    if avg > DEGREE_DAY_BASE {
        (0, (rounded - base).max(0))
    } else if avg < DEGREE_DAY_BASE {
        ((base - rounded).max(0), 0)
    } else {
        (0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherPhenomenon;

    #[test]
    fn test_degree_days() {
        assert_eq!(degree_days(50, 30), (25, 0));
        assert_eq!(degree_days(90, 70), (0, 15));
        assert_eq!(degree_days(70, 60), (0, 0));
        // 64.5 rounds to 65: below base but no whole heating degree
        assert_eq!(degree_days(70, 59), (0, 0));
        assert_eq!(degree_days(MISSING, 30), (MISSING_DEGREE_DAY, MISSING_DEGREE_DAY));
    }

    #[test]
    fn test_refresh_derived() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut obs = DailyObservation::missing("KSEA", date);
        obs.max_temp = 50;
        obs.min_temp = 30;
        obs.weather.set(WeatherPhenomenon::Rain, true);
        obs.weather.set(WeatherPhenomenon::Fog, true);
        obs.refresh_derived();
        assert_eq!(obs.num_wx, 2);
        assert_eq!(obs.num_heat, 25);
        assert_eq!(obs.num_cool, 0);
    }

    #[test]
    fn test_missing_wind() {
        assert!(Wind::missing().is_missing());
        assert!(!Wind::new(270, 12.0).is_missing());
    }
}
