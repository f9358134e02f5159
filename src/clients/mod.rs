/// External API clients module
use crate::config::{UpstreamConfig, Units};
use crate::domain::{
    GeoLocation, GeocodingResponse, GeocodingResult, MeteoCurrentResponse, MeteoDailyResponse,
    MeteoHourlyResponse, OwmForecastResponse,
};
use crate::errors::{ApiError, ApiResult};
use crate::utils::truncate_body;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// HTTP client wrapper with common configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("kiosk-weather/0.1")
            .build()?;
        Ok(Self { client, timeout })
    }

    /// GET with this client's per-request deadline
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url).timeout(self.timeout)
    }

    /// Send a request and decode its JSON body.
    ///
    /// Transport failures and timeouts become `Fetch`; non-success statuses
    /// and undecodable bodies become `UpstreamStatus`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        upstream: &'static str,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let resp = request
            .send()
            .await
            .map_err(|source| ApiError::Fetch { upstream, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| ApiError::Fetch { upstream, source })?;

        if !status.is_success() {
            return Err(ApiError::UpstreamStatus {
                upstream,
                detail: format!("status {}: {}", status, truncate_body(&body)),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::UpstreamStatus {
            upstream,
            detail: format!("malformed body: {}", e),
        })
    }
}

/// Location search against the Open-Meteo geocoding API
pub struct GeocodingClient {
    http: HttpClient,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Resolve `"City, ST, CC"` to coordinates and a timezone.
    pub async fn geocode(&self, query: &str) -> ApiResult<GeoLocation> {
        let (name, country) = split_query(query);
        let url = format!("{}/v1/search", self.base_url);
        let request = self.http.get(&url).query(&[
            ("name", name),
            ("count", "10"),
            ("language", "en"),
            ("format", "json"),
        ]);

        let resp: GeocodingResponse = self
            .http
            .get_json("open-meteo geocoding", request)
            .await
            .map_err(|e| {
                error!(stage = "geocode", query, error = %e, "geocoding request failed");
                ApiError::Geocoding {
                    query: query.to_string(),
                }
            })?;

        let results = resp.results.unwrap_or_default();
        pick_result(&results, country).ok_or_else(|| {
            error!(stage = "geocode", query, "geocoding returned no usable result");
            ApiError::Geocoding {
                query: query.to_string(),
            }
        })
    }
}

/// Search name is the first comma segment; a trailing 2-letter segment is a country code.
fn split_query(query: &str) -> (&str, Option<&str>) {
    let parts: Vec<&str> = query.split(',').map(str::trim).collect();
    let name = parts.first().copied().unwrap_or_default();
    let country = parts
        .last()
        .filter(|_| parts.len() > 1)
        .copied()
        .filter(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()));
    (name, country)
}

fn pick_result(results: &[GeocodingResult], country: Option<&str>) -> Option<GeoLocation> {
    let usable = |r: &GeocodingResult| match (r.latitude, r.longitude, &r.timezone) {
        (Some(latitude), Some(longitude), Some(tz)) => Some(GeoLocation {
            latitude,
            longitude,
            timezone: tz.clone(),
        }),
        _ => None,
    };

    let by_country = country.and_then(|cc| {
        results
            .iter()
            .filter(|r| {
                r.country_code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(cc))
            })
            .find_map(usable)
    });
    by_country.or_else(|| results.iter().find_map(usable))
}

/// Open-Meteo forecast API
pub struct OpenMeteoClient {
    http: HttpClient,
    base_url: String,
}

/// Coordinates and presentation settings shared by every forecast call
#[derive(Debug, Clone)]
pub struct MeteoQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub units: Units,
    pub timezone: Option<String>,
}

impl MeteoQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("temperature_unit", self.units.temperature_unit().to_string()),
            ("precipitation_unit", "mm".to_string()),
            (
                "timezone",
                self.timezone.clone().unwrap_or_else(|| "auto".to_string()),
            ),
        ]
    }
}

impl OpenMeteoClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn forecast_request(&self, q: &MeteoQuery) -> RequestBuilder {
        let url = format!("{}/v1/forecast", self.base_url);
        self.http.get(&url).query(&q.params())
    }

    /// Current temperature, condition code and day flag
    pub async fn fetch_current(&self, q: &MeteoQuery) -> ApiResult<MeteoCurrentResponse> {
        let request = self
            .forecast_request(q)
            .query(&[("current", "temperature_2m,weather_code,is_day")]);
        self.http.get_json("open-meteo current", request).await
    }

    /// Daily max/min/code and sunrise/sunset, today first
    pub async fn fetch_daily(&self, q: &MeteoQuery, days: usize) -> ApiResult<MeteoDailyResponse> {
        let request = self.forecast_request(q).query(&[
            (
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset".to_string(),
            ),
            ("forecast_days", days.to_string()),
        ]);
        self.http.get_json("open-meteo daily", request).await
    }

    /// Hourly snowfall and condition codes around now
    pub async fn fetch_hourly(
        &self,
        q: &MeteoQuery,
        past_hours: u32,
    ) -> ApiResult<MeteoHourlyResponse> {
        let request = self.forecast_request(q).query(&[
            ("hourly", "snowfall,weather_code".to_string()),
            ("past_hours", past_hours.to_string()),
            ("forecast_hours", "2".to_string()),
        ]);
        self.http.get_json("open-meteo hourly", request).await
    }
}

/// OpenWeather 5-day / 3-hour forecast
pub struct OpenWeatherClient {
    http: HttpClient,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: &str,
        units: Units,
    ) -> ApiResult<OwmForecastResponse> {
        if api_key.is_empty() {
            return Err(ApiError::ConfigInvalid(
                "apiKey is required for the openWeather forecast provider".into(),
            ));
        }
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let request = self.http.get(&url).query(&[
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("appid", api_key.to_string()),
            ("units", units.as_str().to_string()),
        ]);
        debug!("requesting openweather 3-hourly forecast");
        self.http.get_json("openweather forecast", request).await
    }
}

/// All upstream clients, built from one shared HTTP client
pub struct Upstreams {
    pub geocoder: GeocodingClient,
    pub open_meteo: OpenMeteoClient,
    pub openweather: OpenWeatherClient,
}

impl Upstreams {
    pub fn new(cfg: &UpstreamConfig) -> ApiResult<Self> {
        let http = HttpClient::new(cfg.timeout)?;
        Ok(Self {
            geocoder: GeocodingClient::new(http.clone(), cfg.geocoding_url.clone()),
            open_meteo: OpenMeteoClient::new(http.clone(), cfg.open_meteo_url.clone()),
            openweather: OpenWeatherClient::new(http, cfg.openweather_url.clone()),
        })
    }
}
