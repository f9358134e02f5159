/// Domain models for the application
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Display icon keys understood by the kiosk front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconKey {
    ClearDay,
    ClearNight,
    PartlycloudyDay,
    PartlycloudyNight,
    Cloudy,
    Fog,
    Rain,
    ShowersDay,
    ShowersNight,
    Sleet,
    Snow,
    Thunderstorm,
    Thundersnow,
}

impl IconKey {
    #[cfg(test)]
    pub const ALL: [IconKey; 13] = [
        IconKey::ClearDay,
        IconKey::ClearNight,
        IconKey::PartlycloudyDay,
        IconKey::PartlycloudyNight,
        IconKey::Cloudy,
        IconKey::Fog,
        IconKey::Rain,
        IconKey::ShowersDay,
        IconKey::ShowersNight,
        IconKey::Sleet,
        IconKey::Snow,
        IconKey::Thunderstorm,
        IconKey::Thundersnow,
    ];
}

/// Current conditions as rendered on the display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temp: i32,
    pub high: i32,
    pub low: i32,
    pub condition_code: i32,
    pub icon: IconKey,
    pub is_daytime: bool,
    pub is_thundersnow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<DateTime<FixedOffset>>,
}

/// One future day of the forecast strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp: i32,
    pub high: i32,
    pub low: i32,
    pub condition_code: i32,
    pub icon: IconKey,
    pub is_daytime: bool,
    pub is_thundersnow: bool,
}

/// The unit served by `/weather` and held by the Freshness Cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_age_ms: Option<i64>,
}

/// Resolved geocoding result
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

// ---------------------------------------------------------------------------
// Raw provider shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoCurrentResponse {
    pub current: MeteoCurrent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoCurrent {
    pub temperature_2m: f64,
    pub weather_code: i32,
    /// 1 during daylight, 0 otherwise
    pub is_day: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoDailyResponse {
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub daily: Option<MeteoDaily>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoDaily {
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise: Vec<Option<String>>,
    #[serde(default)]
    pub sunset: Vec<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoHourlyResponse {
    #[serde(default)]
    pub hourly: Option<MeteoHourly>,
}

/// Hourly precipitation samples; snowfall is in centimetres
#[derive(Debug, Clone, Deserialize)]
pub struct MeteoHourly {
    pub time: Vec<String>,
    #[serde(default)]
    pub snowfall: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwmForecastResponse {
    pub city: OwmCity,
    pub list: Vec<OwmForecastEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwmCity {
    /// Shift from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwmForecastEntry {
    pub dt: i64,
    pub main: OwmMain,
    pub weather: Vec<OwmWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwmMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwmWeather {
    pub id: i32,
}

/// Everything one pipeline run pulled from upstream
#[derive(Debug, Clone)]
pub struct UpstreamBundle {
    pub current: MeteoCurrentResponse,
    pub daily: MeteoDailyResponse,
    /// `None` when the hourly call failed; the recent-snow rule is skipped.
    pub hourly: Option<MeteoHourlyResponse>,
    pub three_hourly: Option<OwmForecastResponse>,
}

// ---------------------------------------------------------------------------
// Auxiliary endpoints
// ---------------------------------------------------------------------------

/// Health check response
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
    pub cache: CacheStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub holding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Day,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseSource {
    /// Today's sunrise/sunset from the held payload
    Sun,
    /// Fixed local hour-of-day window
    Clock,
}

/// Background switch hint for the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundPhase {
    pub phase: Phase,
    pub source: PhaseSource,
}
