use crate::stats::{extreme_by, mean, round_to};
use chrono::NaiveDate;
use clqc_core::date_range::DateRange;
use clqc_core::missing::{is_trace, Sentinel, EPSILON, MISSING, TRACE};
use clqc_core::observation::{degree_days, DailyObservation, Wind};
use clqc_core::period::{PeriodAggregate, PeriodType};
use clqc_core::provenance::FieldProvenance;
use clqc_core::record::amount_rank;
use clqc_core::settings::ClimateThresholds;
use clqc_core::weather::{WeatherCounts, WeatherPhenomenon};

const DAILY: FieldProvenance = FieldProvenance::ValueFromDaily;

/// Sky cover fraction below which a day counts as fair.
pub const FAIR_SKY_LIMIT: f32 = 0.35;
/// Sky cover fraction below which a day counts as partly cloudy.
pub const PARTLY_CLOUDY_SKY_LIMIT: f32 = 0.75;

/// Build the aggregate for `station_id` over `range` from daily rows.
///
/// Rows for other stations or outside the range are ignored. Every governed
/// field that receives a value is stamped `ValueFromDaily`; fields with no
/// usable daily input stay missing. With no rows at all the result is the
/// all-missing aggregate.
pub fn build_period(
    station_id: &str,
    period_type: PeriodType,
    range: DateRange,
    days: &[DailyObservation],
    thresholds: &ClimateThresholds,
) -> PeriodAggregate {
    let days: Vec<&DailyObservation> = days
        .iter()
        .filter(|d| d.station_id == station_id && range.contains(&d.date))
        .collect();
    let mut agg = PeriodAggregate::missing(station_id, period_type, range);
    if days.is_empty() {
        log::warn!(
            "build: no daily rows for {} {} {}",
            station_id,
            period_type,
            range
        );
        return agg;
    }

    build_max_temp(&mut agg, &days, thresholds);
    build_min_temp(&mut agg, &days, thresholds);
    build_mean_temp(&mut agg, &days);
    build_precip(&mut agg, &days, thresholds);
    build_snow(&mut agg, &days, thresholds);
    build_depth(&mut agg, &days);
    build_wind(&mut agg, &days);
    build_sun_and_sky(&mut agg, &days);
    build_humidity(&mut agg, &days);
    build_weather(&mut agg, &days);

    log::info!(
        "build: {} {} {} from {} daily rows",
        station_id,
        period_type,
        range,
        days.len()
    );
    agg
}

fn count(values: &[(NaiveDate, i32)], pred: impl Fn(i32) -> bool) -> i32 {
    values.iter().filter(|(_, v)| pred(*v)).count() as i32
}

/// Day count against a configurable threshold; missing when the threshold
/// is not configured.
fn threshold_count(
    values: &[(NaiveDate, i32)],
    threshold: i32,
    pred: impl Fn(i32, i32) -> bool,
) -> i32 {
    if threshold.is_missing() {
        MISSING
    } else {
        count(values, |v| pred(v, threshold))
    }
}

fn amount_count(values: &[(NaiveDate, f32)], threshold: f32) -> i32 {
    if threshold.is_missing() {
        return MISSING;
    }
    values
        .iter()
        .filter(|(_, v)| !is_trace(*v) && *v as f64 + EPSILON >= threshold as f64)
        .count() as i32
}

/// Sum of measurable amounts; a trace when only traces were reported.
fn amount_total(values: &[(NaiveDate, f32)]) -> f32 {
    let measurable: f64 = values
        .iter()
        .filter(|(_, v)| !is_trace(*v))
        .map(|(_, v)| *v as f64)
        .sum();
    if measurable > 0.0 {
        round_to(measurable, 2) as f32
    } else if values.iter().any(|(_, v)| is_trace(*v)) {
        TRACE
    } else {
        0.0
    }
}

fn build_max_temp(agg: &mut PeriodAggregate, days: &[&DailyObservation], t: &ClimateThresholds) {
    let values: Vec<(NaiveDate, i32)> = days
        .iter()
        .filter(|d| !d.max_temp.is_missing())
        .map(|d| (d.date, d.max_temp))
        .collect();
    let Some((max, dates)) = extreme_by(&values, |v| v as f64, true) else {
        return;
    };
    agg.max_temp = max;
    agg.max_temp_dates = dates;
    agg.methods.max_temp = DAILY;

    if let Some(avg) = mean(values.iter().map(|(_, v)| *v as f64)) {
        agg.max_temp_mean = round_to(avg, 1) as f32;
        agg.methods.avg_max_temp = DAILY;
    }
    agg.num_max_ge_90 = count(&values, |v| v >= 90);
    agg.methods.max_temp_ge_90 = DAILY;
    agg.num_max_le_32 = count(&values, |v| v <= 32);
    agg.methods.max_temp_le_32 = DAILY;
    agg.num_max_ge_t1 = threshold_count(&values, t.t1, |v, limit| v >= limit);
    agg.num_max_ge_t2 = threshold_count(&values, t.t2, |v, limit| v >= limit);
    agg.num_max_le_t3 = threshold_count(&values, t.t3, |v, limit| v <= limit);
}

fn build_min_temp(agg: &mut PeriodAggregate, days: &[&DailyObservation], t: &ClimateThresholds) {
    let values: Vec<(NaiveDate, i32)> = days
        .iter()
        .filter(|d| !d.min_temp.is_missing())
        .map(|d| (d.date, d.min_temp))
        .collect();
    let Some((min, dates)) = extreme_by(&values, |v| v as f64, false) else {
        return;
    };
    agg.min_temp = min;
    agg.min_temp_dates = dates;
    agg.methods.min_temp = DAILY;

    if let Some(avg) = mean(values.iter().map(|(_, v)| *v as f64)) {
        agg.min_temp_mean = round_to(avg, 1) as f32;
        agg.methods.avg_min_temp = DAILY;
    }
    agg.num_min_le_32 = count(&values, |v| v <= 32);
    agg.methods.min_le_32 = DAILY;
    agg.num_min_le_0 = count(&values, |v| v <= 0);
    agg.methods.min_le_0 = DAILY;
    agg.num_min_ge_t4 = threshold_count(&values, t.t4, |v, limit| v >= limit);
    agg.num_min_le_t5 = threshold_count(&values, t.t5, |v, limit| v <= limit);
    agg.num_min_le_t6 = threshold_count(&values, t.t6, |v, limit| v <= limit);
}

fn build_mean_temp(agg: &mut PeriodAggregate, days: &[&DailyObservation]) {
    let both: Vec<(i32, i32)> = days
        .iter()
        .filter(|d| !d.max_temp.is_missing() && !d.min_temp.is_missing())
        .map(|d| (d.max_temp, d.min_temp))
        .collect();
    let Some(avg) = mean(both.iter().map(|(hi, lo)| (*hi + *lo) as f64 / 2.0)) else {
        return;
    };
    agg.mean_temp = round_to(avg, 1) as f32;
    agg.methods.mean_temp = DAILY;

    let (heat, cool) = both
        .iter()
        .map(|(hi, lo)| degree_days(*hi, *lo))
        .fold((0, 0), |(h, c), (dh, dc)| (h + dh, c + dc));
    agg.num_heat_total = heat;
    agg.methods.heat = DAILY;
    agg.num_cool_total = cool;
    agg.methods.cool = DAILY;
}

fn build_precip(agg: &mut PeriodAggregate, days: &[&DailyObservation], t: &ClimateThresholds) {
    let values: Vec<(NaiveDate, f32)> = days
        .iter()
        .filter(|d| !d.precip.is_missing())
        .map(|d| (d.date, d.precip))
        .collect();
    if values.is_empty() {
        return;
    }
    let total = amount_total(&values);
    agg.precip_total = total;
    agg.precip_mean_day = if is_trace(total) {
        TRACE
    } else {
        round_to(total as f64 / values.len() as f64, 2) as f32
    };
    agg.methods.precip = DAILY;

    agg.num_precip_ge_01 = amount_count(&values, 0.01);
    agg.methods.precip_ge_01 = DAILY;
    agg.num_precip_ge_10 = amount_count(&values, 0.10);
    agg.methods.precip_ge_10 = DAILY;
    agg.num_precip_ge_50 = amount_count(&values, 0.50);
    agg.methods.precip_ge_50 = DAILY;
    agg.num_precip_ge_100 = amount_count(&values, 1.00);
    agg.methods.precip_ge_100 = DAILY;
    agg.num_precip_ge_p1 = amount_count(&values, t.p1);
    agg.num_precip_ge_p2 = amount_count(&values, t.p2);
}

fn build_snow(agg: &mut PeriodAggregate, days: &[&DailyObservation], t: &ClimateThresholds) {
    let values: Vec<(NaiveDate, f32)> = days
        .iter()
        .filter(|d| !d.snow_day.is_missing())
        .map(|d| (d.date, d.snow_day))
        .collect();
    if values.is_empty() {
        return;
    }
    agg.snow_total = amount_total(&values);
    agg.num_snow_ge_trace = values
        .iter()
        .filter(|(_, v)| is_trace(*v) || *v > 0.0)
        .count() as i32;
    agg.num_snow_ge_1 = amount_count(&values, 1.0);
    agg.num_snow_ge_s1 = amount_count(&values, t.s1);
}

fn build_depth(agg: &mut PeriodAggregate, days: &[&DailyObservation]) {
    let values: Vec<(NaiveDate, f32)> = days
        .iter()
        .filter(|d| !d.snow_ground.is_missing())
        .map(|d| (d.date, d.snow_ground))
        .collect();
    if let Some((max, dates)) = extreme_by(&values, |v| amount_rank(v as f64), true) {
        agg.snow_ground_max = max;
        agg.snow_ground_max_dates = dates;
        agg.methods.max_depth = DAILY;
    }
}

/// Vector mean of resultant winds, direction in whole degrees (1..=360).
fn vector_mean(winds: &[Wind]) -> Option<Wind> {
    if winds.is_empty() {
        return None;
    }
    let (x, y) = winds.iter().fold((0.0f64, 0.0f64), |(x, y), w| {
        let rad = (w.dir as f64).to_radians();
        (x + w.speed as f64 * rad.sin(), y + w.speed as f64 * rad.cos())
    });
    let n = winds.len() as f64;
    let speed = (x / n).hypot(y / n);
    let mut dir = x.atan2(y).to_degrees().round() as i32;
    if dir <= 0 {
        dir += 360;
    }
    Some(Wind::new(dir, round_to(speed, 1) as f32))
}

fn peak_winds(
    days: &[&DailyObservation],
    pick: impl Fn(&DailyObservation) -> Wind,
) -> Option<(Vec<Wind>, Vec<NaiveDate>)> {
    let values: Vec<(NaiveDate, Wind)> = days
        .iter()
        .map(|d| (d.date, pick(*d)))
        .filter(|(_, w)| !w.is_missing())
        .collect();
    let (peak, dates) = extreme_by(&values, |w| w.speed as f64, true)?;
    let winds = values
        .iter()
        .filter(|(d, w)| dates.contains(d) && (w.speed - peak.speed).abs() < EPSILON as f32)
        .map(|(_, w)| *w)
        .collect();
    Some((winds, dates))
}

fn build_wind(agg: &mut PeriodAggregate, days: &[&DailyObservation]) {
    if let Some(avg) = mean(
        days.iter()
            .filter(|d| !d.avg_wind_speed.is_missing())
            .map(|d| d.avg_wind_speed as f64),
    ) {
        agg.avg_wind_speed = round_to(avg, 1) as f32;
    }
    let resultants: Vec<Wind> = days
        .iter()
        .map(|d| d.result_wind)
        .filter(|w| !w.is_missing() && !w.dir.is_missing())
        .collect();
    if let Some(w) = vector_mean(&resultants) {
        agg.result_wind = w;
    }
    if let Some((winds, dates)) = peak_winds(days, |d| d.max_wind) {
        agg.max_wind_list = winds;
        agg.max_wind_dates = dates;
    }
    if let Some((winds, dates)) = peak_winds(days, |d| d.max_gust) {
        agg.max_gust_list = winds;
        agg.max_gust_dates = dates;
    }
}

fn build_sun_and_sky(agg: &mut PeriodAggregate, days: &[&DailyObservation]) {
    if let Some(avg) = mean(
        days.iter()
            .filter(|d| !d.percent_poss_sun.is_missing())
            .map(|d| d.percent_poss_sun as f64),
    ) {
        agg.poss_sun = avg.round() as i32;
        agg.methods.poss_sun = DAILY;
    }

    let sky: Vec<f32> = days
        .iter()
        .filter(|d| !d.sky_cover.is_missing())
        .map(|d| d.sky_cover)
        .collect();
    let Some(avg) = mean(sky.iter().map(|v| *v as f64)) else {
        return;
    };
    agg.mean_sky_cover = round_to(avg, 2) as f32;
    agg.num_fair_days = sky.iter().filter(|v| **v < FAIR_SKY_LIMIT).count() as i32;
    agg.methods.fair_days = DAILY;
    agg.num_partly_cloudy_days = sky
        .iter()
        .filter(|v| **v >= FAIR_SKY_LIMIT && **v < PARTLY_CLOUDY_SKY_LIMIT)
        .count() as i32;
    agg.methods.pc_days = DAILY;
    agg.num_cloudy_days = sky.iter().filter(|v| **v >= PARTLY_CLOUDY_SKY_LIMIT).count() as i32;
    agg.methods.cloudy_days = DAILY;
}

fn build_humidity(agg: &mut PeriodAggregate, days: &[&DailyObservation]) {
    if let Some(avg) = mean(
        days.iter()
            .filter(|d| !d.max_rel_humid.is_missing() && !d.min_rel_humid.is_missing())
            .map(|d| (d.max_rel_humid + d.min_rel_humid) as f64 / 2.0),
    ) {
        agg.mean_rh = avg.round() as i32;
    }
}

fn build_weather(agg: &mut PeriodAggregate, days: &[&DailyObservation]) {
    let mut counts = WeatherCounts([0; clqc_core::weather::NUM_WEATHER_TYPES]);
    for day in days {
        for p in WeatherPhenomenon::ALL {
            if day.weather.get(p) {
                counts.0[p.index()] += 1;
            }
        }
    }
    agg.weather_days = counts;
}
