/// Application configuration module
use crate::errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEOCODING_API_URL: &str = "https://geocoding-api.open-meteo.com";
pub const DEFAULT_OPEN_METEO_API_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_OPENWEATHER_API_URL: &str = "https://api.openweathermap.org";

/// Process-level settings, read once at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub location_config_path: PathBuf,
    pub upstreams: UpstreamConfig,
    pub cache_warm_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub geocoding_url: String,
    pub open_meteo_url: String,
    pub openweather_url: String,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_API_URL.to_string(),
            open_meteo_url: DEFAULT_OPEN_METEO_API_URL.to_string(),
            openweather_url: DEFAULT_OPENWEATHER_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let location_config_path = env::var("WEATHER_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"));

        let upstreams = UpstreamConfig {
            geocoding_url: env::var("GEOCODING_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODING_API_URL.to_string()),
            open_meteo_url: env::var("OPEN_METEO_API_URL")
                .unwrap_or_else(|_| DEFAULT_OPEN_METEO_API_URL.to_string()),
            openweather_url: env::var("OPENWEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_API_URL.to_string()),
            timeout: Duration::from_secs(env_u64("UPSTREAM_TIMEOUT_SECS", 10)),
        };

        Ok(Self {
            bind_addr,
            location_config_path,
            upstreams,
            cache_warm_seconds: env_u64("CACHE_WARM_SECONDS", 0),
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    #[default]
    Imperial,
}

impl Units {
    /// Open-Meteo `temperature_unit` value
    pub fn temperature_unit(self) -> &'static str {
        match self {
            Units::Metric => "celsius",
            Units::Imperial => "fahrenheit",
        }
    }

    /// OpenWeather `units` value
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

/// Where the multi-day forecast comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ForecastProvider {
    /// Daily max/min/code series
    #[default]
    OpenMeteo,
    /// 5-day / 3-hour series
    OpenWeather,
}

/// Switches for the individual derivation heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivationRules {
    pub thundersnow: bool,
    pub recent_snow: bool,
    pub clamp_hi_lo: bool,
}

impl Default for DerivationRules {
    fn default() -> Self {
        Self {
            thundersnow: true,
            recent_snow: true,
            clamp_hi_lo: true,
        }
    }
}

/// The persisted per-kiosk location config (`config.json`).
///
/// Latitude, longitude and timezone are filled in by the geocoder the first
/// time they are missing and then written back to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationConfig {
    #[serde(alias = "location")]
    pub location_query: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub units: Units,
    #[serde(default, alias = "lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thundersnow_threshold_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thundersnow_threshold_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_snow_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_snow_mm_threshold: Option<f64>,
    #[serde(default)]
    pub forecast_provider: ForecastProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_days: Option<usize>,
    #[serde(default)]
    pub rules: DerivationRules,
}

pub const DEFAULT_THUNDERSNOW_F: f64 = 34.0;
pub const DEFAULT_THUNDERSNOW_C: f64 = 1.0;
pub const DEFAULT_RECENT_SNOW_HOURS: u32 = 2;
pub const DEFAULT_RECENT_SNOW_MM: f64 = 0.0;
pub const DEFAULT_FORECAST_DAYS: usize = 5;

/// Open-Meteo serves at most 16 forecast days; one is today
pub const MAX_FORECAST_DAYS: usize = 15;
/// Open-Meteo serves at most 92 past hours; one extra is requested
pub const MAX_RECENT_SNOW_HOURS: u32 = 91;

impl LocationConfig {
    #[cfg(test)]
    pub fn new(location_query: impl Into<String>, units: Units) -> Self {
        Self {
            location_query: location_query.into(),
            api_key: String::new(),
            units,
            latitude: None,
            longitude: None,
            timezone: None,
            thundersnow_threshold_f: None,
            thundersnow_threshold_c: None,
            recent_snow_hours: None,
            recent_snow_mm_threshold: None,
            forecast_provider: ForecastProvider::default(),
            forecast_days: None,
            rules: DerivationRules::default(),
        }
    }

    /// Resolved coordinates, if the geocoder has already run.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn needs_geocoding(&self) -> bool {
        self.coordinates().is_none() || self.timezone.is_none()
    }

    /// Thundersnow cut-off in the active unit system.
    pub fn thundersnow_threshold(&self) -> f64 {
        match self.units {
            Units::Imperial => self.thundersnow_threshold_f.unwrap_or(DEFAULT_THUNDERSNOW_F),
            Units::Metric => self.thundersnow_threshold_c.unwrap_or(DEFAULT_THUNDERSNOW_C),
        }
    }

    pub fn recent_snow_hours(&self) -> u32 {
        self.recent_snow_hours.unwrap_or(DEFAULT_RECENT_SNOW_HOURS)
    }

    pub fn recent_snow_mm_threshold(&self) -> f64 {
        self.recent_snow_mm_threshold.unwrap_or(DEFAULT_RECENT_SNOW_MM)
    }

    pub fn forecast_days(&self) -> usize {
        self.forecast_days.unwrap_or(DEFAULT_FORECAST_DAYS)
    }

    /// Reject settings no pipeline run could satisfy.
    pub fn validate(&self) -> ApiResult<()> {
        if self.forecast_provider == ForecastProvider::OpenWeather && self.api_key.trim().is_empty()
        {
            return Err(ApiError::ConfigInvalid(
                "apiKey is required for the openWeather forecast provider".into(),
            ));
        }
        if self.forecast_days() > MAX_FORECAST_DAYS {
            return Err(ApiError::ConfigInvalid(format!(
                "forecastDays must be at most {}, got {}",
                MAX_FORECAST_DAYS,
                self.forecast_days()
            )));
        }
        if self.recent_snow_hours() > MAX_RECENT_SNOW_HOURS {
            return Err(ApiError::ConfigInvalid(format!(
                "recentSnowHours must be at most {}, got {}",
                MAX_RECENT_SNOW_HOURS,
                self.recent_snow_hours()
            )));
        }
        Ok(())
    }
}
