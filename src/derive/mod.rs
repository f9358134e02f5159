//! Derivation engine: turns raw upstream responses into the display payload.
//!
//! Every rule is a small pure function so it can be toggled and tested on
//! its own. Order for the current conditions is fixed: recent-snow override,
//! then thundersnow inference, then icon mapping, then hi/lo clamping.

use crate::config::{ForecastProvider, LocationConfig};
use crate::domain::{
    CurrentConditions, ForecastDay, IconKey, MeteoDaily, MeteoHourly, OwmForecastResponse,
    UpstreamBundle, WeatherPayload,
};
use crate::errors::{ApiError, ApiResult};
use crate::utils::{
    fixed_offset, local_now, nearest_index, parse_local_time, round_temp, with_offset,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// WMO "moderate snow fall"
pub const MODERATE_SNOW: i32 = 73;

pub fn is_snow_code(code: i32) -> bool {
    matches!(code, 71 | 73 | 75 | 77 | 85 | 86)
}

pub fn is_thunderstorm_code(code: i32) -> bool {
    matches!(code, 95 | 96 | 99)
}

/// Map a WMO weather code plus day/night flag to an icon key.
pub fn icon_for(code: i32, is_day: bool) -> IconKey {
    let day_night = |day, night| if is_day { day } else { night };
    match code {
        0 | 1 => day_night(IconKey::ClearDay, IconKey::ClearNight),
        2 => day_night(IconKey::PartlycloudyDay, IconKey::PartlycloudyNight),
        3 => IconKey::Cloudy,
        45 | 48 => IconKey::Fog,
        51 | 53 | 55 | 80..=82 => day_night(IconKey::ShowersDay, IconKey::ShowersNight),
        61 | 63 | 65 => IconKey::Rain,
        56 | 57 | 66 | 67 => IconKey::Sleet,
        71 | 73 | 75 | 77 | 85 | 86 => IconKey::Snow,
        95 | 96 | 99 => IconKey::Thunderstorm,
        _ => IconKey::Cloudy,
    }
}

/// A thunderstorm at or below the threshold is thundersnow.
pub fn is_thundersnow(code: i32, temperature: f64, threshold: f64) -> bool {
    is_thunderstorm_code(code) && temperature <= threshold
}

/// Icon after the thundersnow refinement.
pub fn refined_icon(code: i32, is_day: bool, thundersnow: bool) -> IconKey {
    if thundersnow {
        IconKey::Thundersnow
    } else {
        icon_for(code, is_day)
    }
}

/// Stretch the day's range so it contains the current reading.
pub fn clamp_hi_lo(current: i32, high: i32, low: i32) -> (i32, i32) {
    (high.max(current), low.min(current))
}

/// Fold an OpenWeather condition id into the WMO code space.
pub fn wmo_from_openweather(id: i32) -> i32 {
    match id {
        200..=299 => 95,
        300..=399 => 53,
        500 => 61,
        501 => 63,
        502..=504 => 65,
        511 => 66,
        520 => 80,
        521 => 81,
        522..=531 => 82,
        600 | 620 => 71,
        601 | 621 => 73,
        602 | 622 => 75,
        611..=616 => 67,
        700..=799 => 45,
        800 => 0,
        801 => 1,
        802 => 2,
        803 | 804 => 3,
        _ => 3,
    }
}

/// Whether snow fell within the trailing window ending at the sample nearest `now_local`.
///
/// Missing or unparseable series yield `false`.
pub fn recent_snow(
    hourly: Option<&MeteoHourly>,
    now_local: NaiveDateTime,
    hours: u32,
    threshold_mm: f64,
) -> bool {
    let Some(hourly) = hourly else {
        return false;
    };

    let times: Option<Vec<NaiveDateTime>> =
        hourly.time.iter().map(|t| parse_local_time(t)).collect();
    let Some(times) = times else {
        debug!("hourly series has unparseable timestamps; skipping recent-snow check");
        return false;
    };
    let Some(anchor) = nearest_index(&times, now_local) else {
        return false;
    };

    let anchor_time = times[anchor];
    let window_start = anchor_time
        .checked_sub_signed(Duration::hours(i64::from(hours)))
        .unwrap_or(NaiveDateTime::MIN);

    (0..=anchor)
        .filter(|&i| times[i] >= window_start && times[i] <= anchor_time)
        .any(|i| {
            let snow_mm = hourly
                .snowfall
                .get(i)
                .copied()
                .flatten()
                .map(|cm| cm * 10.0);
            let code = hourly.weather_code.get(i).copied().flatten();
            snow_mm.is_some_and(|mm| mm > threshold_mm) || code.is_some_and(is_snow_code)
        })
}

fn forecast_day(
    date: NaiveDate,
    temp: f64,
    high: i32,
    low: i32,
    code: i32,
    thundersnow_threshold: Option<f64>,
) -> ForecastDay {
    let thundersnow = thundersnow_threshold.is_some_and(|t| is_thundersnow(code, temp, t));
    ForecastDay {
        date,
        temp: round_temp(temp),
        high,
        low,
        condition_code: code,
        icon: refined_icon(code, true, thundersnow),
        is_daytime: true,
        is_thundersnow: thundersnow,
    }
}

/// Future days from a daily max/min/code series; midpoint temperature per day.
pub fn daily_forecast(
    daily: &MeteoDaily,
    today: NaiveDate,
    days: usize,
    thundersnow_threshold: Option<f64>,
) -> Vec<ForecastDay> {
    let mut out = Vec::with_capacity(days);
    for (i, raw_date) in daily.time.iter().enumerate() {
        if out.len() >= days {
            break;
        }
        let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
            continue;
        };
        if date <= today {
            continue;
        }
        let max = daily.temperature_2m_max.get(i).copied().flatten();
        let min = daily.temperature_2m_min.get(i).copied().flatten();
        let (Some(max), Some(min)) = (max, min) else {
            continue;
        };
        let code = daily.weather_code.get(i).copied().flatten().unwrap_or(3);
        out.push(forecast_day(
            date,
            (max + min) / 2.0,
            round_temp(max),
            round_temp(min),
            code,
            thundersnow_threshold,
        ));
    }
    out
}

/// Future days from a 3-hourly series; prefers a sample between 11:00 and 13:00 local.
pub fn three_hourly_forecast(
    forecast: &OwmForecastResponse,
    now: DateTime<Utc>,
    days: usize,
    thundersnow_threshold: Option<f64>,
) -> ApiResult<Vec<ForecastDay>> {
    let offset = fixed_offset(forecast.city.timezone).ok_or_else(|| {
        ApiError::Derivation(format!(
            "invalid forecast timezone offset {}",
            forecast.city.timezone
        ))
    })?;
    let today = local_now(now, offset).date();

    let mut by_day: BTreeMap<NaiveDate, Vec<(NaiveDateTime, f64, i32)>> = BTreeMap::new();
    for entry in &forecast.list {
        let Some(at) = DateTime::<Utc>::from_timestamp(entry.dt, 0) else {
            continue;
        };
        let local = local_now(at, offset);
        let code = entry
            .weather
            .first()
            .map(|w| wmo_from_openweather(w.id))
            .unwrap_or(3);
        by_day
            .entry(local.date())
            .or_default()
            .push((local, entry.main.temp, code));
    }

    let mut out = Vec::with_capacity(days);
    for (date, mut samples) in by_day {
        if date <= today {
            continue;
        }
        if out.len() >= days {
            break;
        }
        samples.sort_by_key(|(t, _, _)| *t);
        let representative = samples
            .iter()
            .find(|(t, _, _)| (11..=13).contains(&t.hour()))
            .or_else(|| samples.get(samples.len() / 2));
        let Some(&(_, temp, code)) = representative else {
            continue;
        };
        let high = samples
            .iter()
            .map(|(_, t, _)| round_temp(*t))
            .max()
            .unwrap_or(round_temp(temp));
        let low = samples
            .iter()
            .map(|(_, t, _)| round_temp(*t))
            .min()
            .unwrap_or(round_temp(temp));
        out.push(forecast_day(
            date,
            temp,
            high,
            low,
            code,
            thundersnow_threshold,
        ));
    }
    Ok(out)
}

/// Build the full payload from one pipeline run's upstream data.
pub fn derive_payload(
    bundle: &UpstreamBundle,
    cfg: &LocationConfig,
    now: DateTime<Utc>,
) -> ApiResult<WeatherPayload> {
    let rules = cfg.rules;
    let thundersnow_threshold = rules.thundersnow.then(|| cfg.thundersnow_threshold());

    let offset = fixed_offset(bundle.daily.utc_offset_seconds).ok_or_else(|| {
        ApiError::Derivation(format!(
            "invalid utc offset {}",
            bundle.daily.utc_offset_seconds
        ))
    })?;
    let now_local = local_now(now, offset);
    let today = now_local.date();

    let daily = bundle
        .daily
        .daily
        .as_ref()
        .ok_or_else(|| ApiError::Derivation("daily series missing".into()))?;
    if daily.temperature_2m_max.len() != daily.time.len()
        || daily.temperature_2m_min.len() != daily.time.len()
    {
        return Err(ApiError::Derivation(
            "daily temperature arrays do not match the time axis".into(),
        ));
    }

    let today_str = today.format("%Y-%m-%d").to_string();
    let idx = daily
        .time
        .iter()
        .position(|d| *d == today_str)
        .ok_or_else(|| ApiError::Derivation(format!("daily series does not cover {}", today)))?;
    let (Some(raw_high), Some(raw_low)) = (
        daily.temperature_2m_max[idx],
        daily.temperature_2m_min[idx],
    ) else {
        return Err(ApiError::Derivation(format!(
            "no high/low for {}",
            today
        )));
    };

    let raw = &bundle.current.current;
    let temp = round_temp(raw.temperature_2m);
    let is_day = raw.is_day != 0;

    let mut code = raw.weather_code;
    if rules.recent_snow {
        let hourly = bundle.hourly.as_ref().and_then(|h| h.hourly.as_ref());
        if recent_snow(
            hourly,
            now_local,
            cfg.recent_snow_hours(),
            cfg.recent_snow_mm_threshold(),
        ) {
            info!(raw_code = code, "recent snow observed; forcing snow condition");
            code = MODERATE_SNOW;
        }
    }

    let thundersnow =
        thundersnow_threshold.is_some_and(|t| is_thundersnow(code, raw.temperature_2m, t));
    let icon = refined_icon(code, is_day, thundersnow);

    let (mut high, mut low) = (round_temp(raw_high), round_temp(raw_low));
    if rules.clamp_hi_lo {
        (high, low) = clamp_hi_lo(temp, high, low);
    }

    let sun_time = |series: &[Option<String>]| {
        series
            .get(idx)
            .and_then(|s| s.as_deref())
            .and_then(parse_local_time)
            .and_then(|t| with_offset(t, offset))
    };

    let current = CurrentConditions {
        temp,
        high,
        low,
        condition_code: code,
        icon,
        is_daytime: is_day,
        is_thundersnow: thundersnow,
        sunrise: sun_time(&daily.sunrise),
        sunset: sun_time(&daily.sunset),
    };

    let forecast = match cfg.forecast_provider {
        ForecastProvider::OpenMeteo => {
            daily_forecast(daily, today, cfg.forecast_days(), thundersnow_threshold)
        }
        ForecastProvider::OpenWeather => {
            let series = bundle.three_hourly.as_ref().ok_or_else(|| {
                ApiError::Derivation("3-hourly forecast series missing".into())
            })?;
            three_hourly_forecast(series, now, cfg.forecast_days(), thundersnow_threshold)?
        }
    };

    Ok(WeatherPayload {
        current,
        forecast,
        stale: None,
        stale_age_ms: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Units;
    use crate::domain::{
        MeteoCurrent, MeteoCurrentResponse, MeteoDailyResponse, MeteoHourlyResponse, OwmCity,
        OwmForecastEntry, OwmMain, OwmWeather,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // 2026-01-15 10:00 local at UTC-5
        Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap()
    }

    fn daily(days: &[(&str, f64, f64, i32)]) -> MeteoDaily {
        MeteoDaily {
            time: days.iter().map(|d| d.0.to_string()).collect(),
            temperature_2m_max: days.iter().map(|d| Some(d.1)).collect(),
            temperature_2m_min: days.iter().map(|d| Some(d.2)).collect(),
            weather_code: days.iter().map(|d| Some(d.3)).collect(),
            sunrise: days
                .iter()
                .map(|d| Some(format!("{}T07:15", d.0)))
                .collect(),
            sunset: days
                .iter()
                .map(|d| Some(format!("{}T16:45", d.0)))
                .collect(),
        }
    }

    fn six_days() -> MeteoDaily {
        daily(&[
            ("2026-01-15", 34.0, 20.0, 0),
            ("2026-01-16", 30.0, 15.0, 3),
            ("2026-01-17", 28.4, 17.0, 73),
            ("2026-01-18", 40.0, 31.0, 61),
            ("2026-01-19", 33.0, 21.0, 95),
            ("2026-01-20", 45.0, 30.0, 2),
        ])
    }

    fn hourly(samples: &[(&str, f64, i32)]) -> MeteoHourly {
        MeteoHourly {
            time: samples.iter().map(|s| s.0.to_string()).collect(),
            snowfall: samples.iter().map(|s| Some(s.1)).collect(),
            weather_code: samples.iter().map(|s| Some(s.2)).collect(),
        }
    }

    fn bundle(temp: f64, code: i32, hourly_series: Option<MeteoHourly>) -> UpstreamBundle {
        UpstreamBundle {
            current: MeteoCurrentResponse {
                current: MeteoCurrent {
                    temperature_2m: temp,
                    weather_code: code,
                    is_day: 1,
                },
            },
            daily: MeteoDailyResponse {
                utc_offset_seconds: -18000,
                daily: Some(six_days()),
            },
            hourly: hourly_series.map(|h| MeteoHourlyResponse {
                hourly: Some(h),
            }),
            three_hourly: None,
        }
    }

    fn cfg() -> LocationConfig {
        LocationConfig::new("Burlington, VT, US", Units::Imperial)
    }

    #[test]
    fn test_icon_mapping_is_total() {
        for code in -5..=120 {
            for is_day in [true, false] {
                let icon = icon_for(code, is_day);
                assert!(IconKey::ALL.contains(&icon));
                assert_eq!(icon, icon_for(code, is_day));
            }
        }
    }

    #[test]
    fn test_icon_mapping_day_night_and_default() {
        assert_eq!(icon_for(0, true), IconKey::ClearDay);
        assert_eq!(icon_for(0, false), IconKey::ClearNight);
        assert_eq!(icon_for(2, false), IconKey::PartlycloudyNight);
        assert_eq!(icon_for(81, true), IconKey::ShowersDay);
        assert_eq!(icon_for(63, false), IconKey::Rain);
        assert_eq!(icon_for(66, true), IconKey::Sleet);
        assert_eq!(icon_for(48, true), IconKey::Fog);
        assert_eq!(icon_for(42, true), IconKey::Cloudy);
    }

    #[test]
    fn test_thundersnow_is_monotonic_in_temperature() {
        let threshold = 34.0;
        let temps: Vec<f64> = (-200..=600).map(|t| f64::from(t) / 10.0).collect();
        for code in [95, 96, 99] {
            for &t in &temps {
                if is_thundersnow(code, t, threshold) {
                    assert!(temps
                        .iter()
                        .filter(|&&lower| lower <= t)
                        .all(|&lower| is_thundersnow(code, lower, threshold)));
                }
            }
        }
        assert!(is_thundersnow(95, 34.0, threshold));
        assert!(!is_thundersnow(95, 34.1, threshold));
        assert!(!is_thundersnow(73, 10.0, threshold));
    }

    #[test]
    fn test_clamp_is_idempotent_and_ordered() {
        for current in -10..=10 {
            for high in -10..=10 {
                for low in -10..=high {
                    let (h, l) = clamp_hi_lo(current, high, low);
                    assert!(h >= current && current >= l);
                    assert_eq!(clamp_hi_lo(current, h, l), (h, l));
                }
            }
        }
    }

    #[test]
    fn test_end_to_end_clamp_scenario() {
        let payload = derive_payload(&bundle(36.0, 0, None), &cfg(), now()).unwrap();
        assert_eq!(payload.current.temp, 36);
        assert_eq!(payload.current.high, 36);
        assert_eq!(payload.current.low, 20);
    }

    #[test]
    fn test_clamp_rule_can_be_disabled() {
        let mut cfg = cfg();
        cfg.rules.clamp_hi_lo = false;
        let payload = derive_payload(&bundle(36.0, 0, None), &cfg, now()).unwrap();
        assert_eq!(payload.current.high, 34);
    }

    #[test]
    fn test_daily_forecast_windowing() {
        let payload = derive_payload(&bundle(30.0, 3, None), &cfg(), now()).unwrap();
        let forecast = payload.forecast;
        assert_eq!(forecast.len(), 5);
        let dates: Vec<String> = forecast.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2026-01-16", "2026-01-17", "2026-01-18", "2026-01-19", "2026-01-20"]
        );
        let temps: Vec<i32> = forecast.iter().map(|d| d.temp).collect();
        // 22.5 -> 23, 22.7 -> 23, 35.5 -> 36, 27 -> 27, 37.5 -> 38
        assert_eq!(temps, vec![23, 23, 36, 27, 38]);
        assert!(forecast.iter().all(|d| d.is_daytime));
        assert_eq!(forecast[1].icon, IconKey::Snow);
        // thunderstorm with a 27 degree midpoint
        assert!(forecast[3].is_thundersnow);
        assert_eq!(forecast[3].icon, IconKey::Thundersnow);
    }

    #[test]
    fn test_recent_snow_overrides_clear() {
        let series = hourly(&[
            ("2026-01-15T07:00", 0.0, 3),
            ("2026-01-15T08:00", 0.0, 3),
            ("2026-01-15T09:00", 0.2, 0),
            ("2026-01-15T10:00", 0.0, 0),
            ("2026-01-15T11:00", 0.0, 0),
        ]);
        let payload = derive_payload(&bundle(30.0, 0, Some(series)), &cfg(), now()).unwrap();
        assert_eq!(payload.current.condition_code, MODERATE_SNOW);
        assert_eq!(payload.current.icon, IconKey::Snow);
    }

    #[test]
    fn test_recent_snow_window_excludes_older_samples() {
        let series = hourly(&[
            ("2026-01-15T07:00", 1.0, 73),
            ("2026-01-15T08:00", 0.0, 3),
            ("2026-01-15T09:00", 0.0, 3),
            ("2026-01-15T10:00", 0.0, 0),
        ]);
        let now_local = parse_local_time("2026-01-15T10:10").unwrap();
        assert!(!recent_snow(Some(&series), now_local, 2, 0.0));
        assert!(recent_snow(Some(&series), now_local, 3, 0.0));
    }

    #[test]
    fn test_recent_snow_by_code_and_threshold() {
        let series = hourly(&[("2026-01-15T09:00", 0.05, 3), ("2026-01-15T10:00", 0.0, 85)]);
        let now_local = parse_local_time("2026-01-15T10:00").unwrap();
        assert!(recent_snow(Some(&series), now_local, 2, 5.0));

        let series = hourly(&[("2026-01-15T09:00", 0.05, 3), ("2026-01-15T10:00", 0.0, 3)]);
        assert!(!recent_snow(Some(&series), now_local, 2, 5.0));
        assert!(recent_snow(Some(&series), now_local, 2, 0.0));
    }

    #[test]
    fn test_recent_snow_huge_window_covers_whole_series() {
        let series = hourly(&[("2026-01-15T08:00", 0.3, 3), ("2026-01-15T10:00", 0.0, 3)]);
        let now_local = parse_local_time("2026-01-15T10:00").unwrap();
        assert!(recent_snow(Some(&series), now_local, u32::MAX, 0.0));
    }

    #[test]
    fn test_recent_snow_fails_open() {
        let now_local = parse_local_time("2026-01-15T10:00").unwrap();
        assert!(!recent_snow(None, now_local, 2, 0.0));

        let garbled = MeteoHourly {
            time: vec!["not-a-time".into()],
            snowfall: vec![Some(5.0)],
            weather_code: vec![Some(75)],
        };
        assert!(!recent_snow(Some(&garbled), now_local, 2, 0.0));

        let payload = derive_payload(&bundle(30.0, 0, None), &cfg(), now()).unwrap();
        assert_eq!(payload.current.condition_code, 0);
    }

    #[test]
    fn test_snow_override_precedes_thundersnow() {
        let series = hourly(&[("2026-01-15T10:00", 0.5, 73)]);
        let payload = derive_payload(&bundle(20.0, 95, Some(series)), &cfg(), now()).unwrap();
        assert_eq!(payload.current.condition_code, MODERATE_SNOW);
        assert!(!payload.current.is_thundersnow);
        assert_eq!(payload.current.icon, IconKey::Snow);
    }

    #[test]
    fn test_current_thundersnow_uses_unit_threshold() {
        let payload = derive_payload(&bundle(33.0, 95, None), &cfg(), now()).unwrap();
        assert!(payload.current.is_thundersnow);
        assert_eq!(payload.current.icon, IconKey::Thundersnow);

        let payload = derive_payload(&bundle(40.0, 95, None), &cfg(), now()).unwrap();
        assert!(!payload.current.is_thundersnow);
        assert_eq!(payload.current.icon, IconKey::Thunderstorm);

        let mut disabled = cfg();
        disabled.rules.thundersnow = false;
        let payload = derive_payload(&bundle(20.0, 95, None), &disabled, now()).unwrap();
        assert!(!payload.current.is_thundersnow);
    }

    #[test]
    fn test_sunrise_sunset_carry_offset() {
        let payload = derive_payload(&bundle(30.0, 0, None), &cfg(), now()).unwrap();
        let sunrise = payload.current.sunrise.unwrap();
        assert_eq!(sunrise.to_rfc3339(), "2026-01-15T07:15:00-05:00");
        assert!(payload.current.sunset.is_some());
    }

    #[test]
    fn test_missing_daily_is_derivation_error() {
        let mut b = bundle(30.0, 0, None);
        b.daily.daily = None;
        let err = derive_payload(&b, &cfg(), now()).unwrap_err();
        assert!(matches!(err, ApiError::Derivation(_)));
    }

    #[test]
    fn test_daily_not_covering_today_is_derivation_error() {
        let err = derive_payload(
            &bundle(30.0, 0, None),
            &cfg(),
            Utc.with_ymd_and_hms(2026, 2, 1, 15, 0, 0).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Derivation(_)));
    }

    fn owm_entry(local: &str, temp: f64, id: i32) -> OwmForecastEntry {
        // city offset is 0 in these fixtures
        let dt = parse_local_time(local).unwrap().and_utc().timestamp();
        OwmForecastEntry {
            dt,
            main: OwmMain { temp },
            weather: vec![OwmWeather { id }],
        }
    }

    #[test]
    fn test_three_hourly_prefers_midday_sample() {
        let series = OwmForecastResponse {
            city: OwmCity { timezone: 0 },
            list: vec![
                owm_entry("2026-01-15T18:00", 10.0, 800),
                owm_entry("2026-01-16T06:00", 1.0, 800),
                owm_entry("2026-01-16T09:00", 3.0, 801),
                owm_entry("2026-01-16T12:00", 6.4, 500),
                owm_entry("2026-01-16T15:00", 8.0, 804),
                owm_entry("2026-01-17T00:00", -2.0, 600),
                owm_entry("2026-01-17T03:00", -3.0, 601),
                owm_entry("2026-01-17T06:00", -1.0, 211),
            ],
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap();
        let days = three_hourly_forecast(&series, now, 5, Some(1.0)).unwrap();
        assert_eq!(days.len(), 2);

        assert_eq!(days[0].date.to_string(), "2026-01-16");
        assert_eq!(days[0].temp, 6);
        assert_eq!(days[0].condition_code, 61);
        assert_eq!(days[0].icon, IconKey::Rain);
        assert_eq!((days[0].high, days[0].low), (8, 1));

        // no midday sample: temporal midpoint (index 1 of 3)
        assert_eq!(days[1].temp, -3);
        assert_eq!(days[1].condition_code, MODERATE_SNOW);
    }

    #[test]
    fn test_three_hourly_limits_days() {
        let list = (16..=20)
            .map(|d| owm_entry(&format!("2026-01-{}T12:00", d), 5.0, 800))
            .collect();
        let series = OwmForecastResponse {
            city: OwmCity { timezone: 0 },
            list,
        };
        let days = three_hourly_forecast(&series, now(), 3, None).unwrap();
        assert_eq!(days.len(), 3);
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_openweather_provider_requires_series() {
        let mut cfg = cfg();
        cfg.forecast_provider = ForecastProvider::OpenWeather;
        let err = derive_payload(&bundle(30.0, 0, None), &cfg, now()).unwrap_err();
        assert!(matches!(err, ApiError::Derivation(_)));
    }

    #[test]
    fn test_wmo_from_openweather_families() {
        assert!(is_thunderstorm_code(wmo_from_openweather(202)));
        assert!(is_snow_code(wmo_from_openweather(601)));
        assert_eq!(wmo_from_openweather(800), 0);
        assert_eq!(icon_for(wmo_from_openweather(741), true), IconKey::Fog);
        assert_eq!(icon_for(wmo_from_openweather(611), true), IconKey::Sleet);
        assert_eq!(icon_for(wmo_from_openweather(999), true), IconKey::Cloudy);
    }
}
