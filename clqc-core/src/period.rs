use crate::date_range::DateRange;
use crate::missing::{MISSING, MISSING_PRECIP, MISSING_SKY, MISSING_SNOW, MISSING_SPEED};
use crate::observation::Wind;
use crate::provenance::FieldProvenance;
use crate::record::ExtremeValues;
use crate::weather::WeatherCounts;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The aggregation period of a [`PeriodAggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Monthly,
    Seasonal,
    Annual,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Seasonal => "seasonal",
            PeriodType::Annual => "annual",
        }
    }

    /// The period of this type that contains `date`.
    pub fn range_for(&self, date: &NaiveDate) -> Option<DateRange> {
        match self {
            PeriodType::Monthly => DateRange::month_of(date),
            PeriodType::Seasonal => DateRange::season_of(date),
            PeriodType::Annual => DateRange::year_of(date),
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "m" => Ok(PeriodType::Monthly),
            "seasonal" | "season" | "s" => Ok(PeriodType::Seasonal),
            "annual" | "year" | "a" => Ok(PeriodType::Annual),
            other => anyhow::bail!("unknown period type '{}'", other),
        }
    }
}

/// Provenance of the governed fields of a [`PeriodAggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodDataMethods {
    pub max_temp: FieldProvenance,
    pub avg_max_temp: FieldProvenance,
    pub max_temp_ge_90: FieldProvenance,
    pub max_temp_le_32: FieldProvenance,
    pub min_temp: FieldProvenance,
    pub avg_min_temp: FieldProvenance,
    pub min_le_32: FieldProvenance,
    pub min_le_0: FieldProvenance,
    pub mean_temp: FieldProvenance,
    pub precip: FieldProvenance,
    pub precip_ge_01: FieldProvenance,
    pub precip_ge_10: FieldProvenance,
    pub precip_ge_50: FieldProvenance,
    pub precip_ge_100: FieldProvenance,
    pub max_depth: FieldProvenance,
    pub heat: FieldProvenance,
    pub cool: FieldProvenance,
    pub poss_sun: FieldProvenance,
    pub fair_days: FieldProvenance,
    pub pc_days: FieldProvenance,
    pub cloudy_days: FieldProvenance,
}

/// Pre-computed statistics for one station over a month, season or year.
///
/// Temperatures are °F, amounts are inches, wind speeds mph. Extremes carry
/// the dates on which they occurred. Custom threshold counts (`t1`..`t6`,
/// `p1`, `p2`, `s1`) use the station's configured thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    pub station_id: String,
    pub period_type: PeriodType,
    pub range: DateRange,

    pub max_temp: i32,
    pub max_temp_dates: Vec<NaiveDate>,
    pub max_temp_mean: f32,
    pub num_max_ge_90: i32,
    pub num_max_le_32: i32,
    pub num_max_ge_t1: i32,
    pub num_max_ge_t2: i32,
    pub num_max_le_t3: i32,

    pub min_temp: i32,
    pub min_temp_dates: Vec<NaiveDate>,
    pub min_temp_mean: f32,
    pub num_min_le_32: i32,
    pub num_min_le_0: i32,
    pub num_min_ge_t4: i32,
    pub num_min_le_t5: i32,
    pub num_min_le_t6: i32,

    pub mean_temp: f32,
    pub num_heat_total: i32,
    pub num_cool_total: i32,

    pub precip_total: f32,
    pub precip_mean_day: f32,
    pub num_precip_ge_01: i32,
    pub num_precip_ge_10: i32,
    pub num_precip_ge_50: i32,
    pub num_precip_ge_100: i32,
    pub num_precip_ge_p1: i32,
    pub num_precip_ge_p2: i32,

    pub snow_total: f32,
    pub num_snow_ge_trace: i32,
    pub num_snow_ge_1: i32,
    pub num_snow_ge_s1: i32,
    pub snow_ground_max: f32,
    pub snow_ground_max_dates: Vec<NaiveDate>,

    pub avg_wind_speed: f32,
    pub result_wind: Wind,
    pub max_wind_list: Vec<Wind>,
    pub max_wind_dates: Vec<NaiveDate>,
    pub max_gust_list: Vec<Wind>,
    pub max_gust_dates: Vec<NaiveDate>,

    pub poss_sun: i32,
    pub mean_sky_cover: f32,
    pub num_fair_days: i32,
    pub num_partly_cloudy_days: i32,
    pub num_cloudy_days: i32,

    pub mean_rh: i32,
    pub weather_days: WeatherCounts,

    pub methods: PeriodDataMethods,
}

impl PeriodAggregate {
    /// An aggregate with every value missing and every provenance `Missing`.
    pub fn missing(station_id: &str, period_type: PeriodType, range: DateRange) -> Self {
        PeriodAggregate {
            station_id: station_id.to_string(),
            period_type,
            range,
            max_temp: MISSING,
            max_temp_dates: Vec::new(),
            max_temp_mean: MISSING as f32,
            num_max_ge_90: MISSING,
            num_max_le_32: MISSING,
            num_max_ge_t1: MISSING,
            num_max_ge_t2: MISSING,
            num_max_le_t3: MISSING,
            min_temp: MISSING,
            min_temp_dates: Vec::new(),
            min_temp_mean: MISSING as f32,
            num_min_le_32: MISSING,
            num_min_le_0: MISSING,
            num_min_ge_t4: MISSING,
            num_min_le_t5: MISSING,
            num_min_le_t6: MISSING,
            mean_temp: MISSING as f32,
            num_heat_total: MISSING,
            num_cool_total: MISSING,
            precip_total: MISSING_PRECIP,
            precip_mean_day: MISSING_PRECIP,
            num_precip_ge_01: MISSING,
            num_precip_ge_10: MISSING,
            num_precip_ge_50: MISSING,
            num_precip_ge_100: MISSING,
            num_precip_ge_p1: MISSING,
            num_precip_ge_p2: MISSING,
            snow_total: MISSING_SNOW,
            num_snow_ge_trace: MISSING,
            num_snow_ge_1: MISSING,
            num_snow_ge_s1: MISSING,
            snow_ground_max: MISSING_SNOW,
            snow_ground_max_dates: Vec::new(),
            avg_wind_speed: MISSING_SPEED,
            result_wind: Wind::missing(),
            max_wind_list: Vec::new(),
            max_wind_dates: Vec::new(),
            max_gust_list: Vec::new(),
            max_gust_dates: Vec::new(),
            poss_sun: MISSING,
            mean_sky_cover: MISSING_SKY,
            num_fair_days: MISSING,
            num_partly_cloudy_days: MISSING,
            num_cloudy_days: MISSING,
            mean_rh: MISSING,
            weather_days: WeatherCounts::missing(),
            methods: PeriodDataMethods::default(),
        }
    }

    /// True when nothing at all is populated, which is how a failed rebuild
    /// is represented.
    pub fn is_all_missing(&self) -> bool {
        *self == PeriodAggregate::missing(&self.station_id, self.period_type, self.range)
    }

    /// Highest and lowest temperatures with the precipitation and snowfall
    /// totals, as compared against period records.
    pub fn extremes(&self) -> ExtremeValues {
        ExtremeValues {
            max_temp: self.max_temp,
            min_temp: self.min_temp,
            precip: self.precip_total,
            snow: self.snow_total,
        }
    }

    /// Month key of this period's records: the month the period ends in.
    pub fn record_month(&self) -> u32 {
        self.range.end().month()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_type_parse_and_display() {
        assert_eq!("Monthly".parse::<PeriodType>().unwrap(), PeriodType::Monthly);
        assert_eq!("season".parse::<PeriodType>().unwrap(), PeriodType::Seasonal);
        assert_eq!(PeriodType::Annual.to_string(), "annual");
        assert!("weekly".parse::<PeriodType>().is_err());
    }

    #[test]
    fn test_range_for() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let monthly = PeriodType::Monthly.range_for(&date).unwrap();
        assert_eq!(monthly.start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let seasonal = PeriodType::Seasonal.range_for(&date).unwrap();
        assert_eq!(seasonal.start(), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        let annual = PeriodType::Annual.range_for(&date).unwrap();
        assert_eq!(annual.end(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_all_missing() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let range = PeriodType::Monthly.range_for(&date).unwrap();
        let mut agg = PeriodAggregate::missing("KSEA", PeriodType::Monthly, range);
        assert!(agg.is_all_missing());
        agg.max_temp = 55;
        assert!(!agg.is_all_missing());
    }

    #[test]
    fn test_extremes_and_record_month() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let range = PeriodType::Seasonal.range_for(&date).unwrap();
        let mut agg = PeriodAggregate::missing("KSEA", PeriodType::Seasonal, range);
        agg.max_temp = 61;
        agg.precip_total = 14.1;
        let extremes = agg.extremes();
        assert_eq!(extremes.max_temp, 61);
        assert_eq!(extremes.min_temp, MISSING);
        assert_eq!(extremes.precip, 14.1);
        assert_eq!(extremes.snow, MISSING_SNOW);
        // winter runs December through February
        assert_eq!(agg.record_month(), 2);
    }

    #[test]
    fn test_json_round_trip_keeps_provenance_codes() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let range = PeriodType::Monthly.range_for(&date).unwrap();
        let mut agg = PeriodAggregate::missing("KSEA", PeriodType::Monthly, range);
        agg.methods.max_temp = FieldProvenance::ValueFromMsm;
        let json = serde_json::to_string(&agg).unwrap();
        assert!(json.contains("\"period_type\":\"monthly\""));
        let back: PeriodAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, agg);
    }
}
