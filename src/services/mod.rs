/// Business logic services layer
use crate::clients::{MeteoQuery, Upstreams};
use crate::config::{ForecastProvider, LocationConfig};
use crate::derive::derive_payload;
use crate::domain::{
    BackgroundPhase, CacheStatus, CurrentConditions, Phase, PhaseSource, UpstreamBundle,
    WeatherPayload,
};
use crate::errors::{ApiError, ApiResult};
use crate::repo::{ConfigStore, FreshnessCache};
use chrono::{DateTime, Local, Timelike, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Local hours treated as daytime when no sun times are known
const DAY_START_HOUR: u32 = 7;
const NIGHT_START_HOUR: u32 = 21;

/// Weather aggregation service
pub struct WeatherService {
    store: ConfigStore,
    upstreams: Upstreams,
    cache: Arc<dyn FreshnessCache>,
    /// Serialises first-run geocoding so concurrent requests resolve once
    enrich: tokio::sync::Mutex<()>,
}

impl WeatherService {
    pub fn new(store: ConfigStore, upstreams: Upstreams, cache: Arc<dyn FreshnessCache>) -> Self {
        Self {
            store,
            upstreams,
            cache,
            enrich: tokio::sync::Mutex::new(()),
        }
    }

    /// Serve one `/weather` request: fresh payload, stale fallback, or error.
    pub async fn get_weather(&self) -> ApiResult<WeatherPayload> {
        let cfg = self.store.load().await?;
        let cfg = self.ensure_location(cfg).await?;

        match self.fetch_and_derive(&cfg).await {
            Ok(payload) => {
                self.cache.put(payload.clone(), Utc::now());
                Ok(payload)
            }
            Err(e) => self.fallback(e, Utc::now()),
        }
    }

    /// Fill in coordinates and timezone on first use and persist them.
    pub async fn ensure_location(&self, cfg: LocationConfig) -> ApiResult<LocationConfig> {
        if !cfg.needs_geocoding() {
            return Ok(cfg);
        }

        let _enrich = self.enrich.lock().await;
        // another request may have finished geocoding while we waited
        let cfg = self.store.load().await?;
        if !cfg.needs_geocoding() {
            return Ok(cfg);
        }

        let resolved = self.upstreams.geocoder.geocode(&cfg.location_query).await?;
        let cfg = self
            .store
            .update(|latest| {
                if latest.coordinates().is_none() {
                    latest.latitude = Some(resolved.latitude);
                    latest.longitude = Some(resolved.longitude);
                }
                if latest.timezone.is_none() {
                    latest.timezone = Some(resolved.timezone);
                }
            })
            .await?;
        info!(
            query = %cfg.location_query,
            latitude = ?cfg.latitude,
            longitude = ?cfg.longitude,
            timezone = ?cfg.timezone,
            "geocoded location persisted"
        );
        Ok(cfg)
    }

    /// Fan out to every upstream, then run the derivation engine.
    pub async fn fetch_and_derive(&self, cfg: &LocationConfig) -> ApiResult<WeatherPayload> {
        let bundle = self.fetch_upstream(cfg).await?;
        derive_payload(&bundle, cfg, Utc::now())
    }

    async fn fetch_upstream(&self, cfg: &LocationConfig) -> ApiResult<UpstreamBundle> {
        let (latitude, longitude) = cfg.coordinates().ok_or_else(|| {
            ApiError::Geocoding {
                query: cfg.location_query.clone(),
            }
        })?;
        let q = MeteoQuery {
            latitude,
            longitude,
            units: cfg.units,
            timezone: cfg.timezone.clone(),
        };
        let meteo = &self.upstreams.open_meteo;

        let three_hourly = async {
            match cfg.forecast_provider {
                ForecastProvider::OpenWeather => Some(
                    self.upstreams
                        .openweather
                        .fetch_forecast(latitude, longitude, &cfg.api_key, cfg.units)
                        .await,
                ),
                ForecastProvider::OpenMeteo => None,
            }
        };

        let (current, daily, hourly, three_hourly) = tokio::join!(
            meteo.fetch_current(&q),
            meteo.fetch_daily(&q, cfg.forecast_days().saturating_add(1)),
            meteo.fetch_hourly(&q, cfg.recent_snow_hours().saturating_add(1)),
            three_hourly,
        );

        let hourly = match hourly {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(stage = "fetch", error = %e, "hourly series unavailable; recent-snow check skipped");
                None
            }
        };

        let mut failures = Vec::new();
        let current = log_failure(current, &mut failures);
        let daily = log_failure(daily, &mut failures);
        let three_hourly = match three_hourly {
            Some(result) => log_failure(result, &mut failures).map(Some),
            None => Some(None),
        };

        match (current, daily, three_hourly) {
            (Some(current), Some(daily), Some(three_hourly)) => Ok(UpstreamBundle {
                current,
                daily,
                hourly,
                three_hourly,
            }),
            _ => Err(first_fatal(failures)),
        }
    }

    /// Serve the held payload as stale when the failure allows it.
    fn fallback(&self, err: ApiError, now: DateTime<Utc>) -> ApiResult<WeatherPayload> {
        error!(stage = err.stage(), error = %err, "weather pipeline failed");
        if !err.is_recoverable() {
            return Err(err);
        }
        match self.cache.get() {
            Some(held) => {
                let payload = held.as_stale(now);
                warn!(
                    stale_age_ms = payload.stale_age_ms,
                    "serving last good weather payload"
                );
                Ok(payload)
            }
            None => Err(err),
        }
    }

    pub fn cache_status(&self) -> CacheStatus {
        let held = self.cache.get();
        CacheStatus {
            holding: held.is_some(),
            captured_at: held.map(|h| h.captured_at),
        }
    }

    /// Day/night hint for the display background.
    pub fn background_phase(&self) -> BackgroundPhase {
        let held = self.cache.get();
        day_phase(
            Utc::now(),
            held.as_ref().map(|h| &h.payload.current),
            Local::now().hour(),
        )
    }
}

/// Sun times win when they describe today at the location; otherwise the
/// fixed local-clock window decides.
pub fn day_phase(
    now: DateTime<Utc>,
    current: Option<&CurrentConditions>,
    local_hour: u32,
) -> BackgroundPhase {
    if let Some((sunrise, sunset)) = current.and_then(|c| c.sunrise.zip(c.sunset)) {
        let now_there = now.with_timezone(sunrise.offset());
        if sunrise.date_naive() == now_there.date_naive() {
            let phase = if now_there >= sunrise && now_there < sunset {
                Phase::Day
            } else {
                Phase::Night
            };
            return BackgroundPhase {
                phase,
                source: PhaseSource::Sun,
            };
        }
    }

    let phase = if (DAY_START_HOUR..NIGHT_START_HOUR).contains(&local_hour) {
        Phase::Day
    } else {
        Phase::Night
    };
    BackgroundPhase {
        phase,
        source: PhaseSource::Clock,
    }
}

/// The error to report for a failed fan-out; a non-recoverable failure must
/// never be hidden behind a recoverable one.
fn first_fatal(mut failures: Vec<ApiError>) -> ApiError {
    if failures.is_empty() {
        return ApiError::Internal("upstream join lost its error".into());
    }
    let pick = failures
        .iter()
        .position(|e| !e.is_recoverable())
        .unwrap_or(0);
    failures.swap_remove(pick)
}

fn log_failure<T>(result: ApiResult<T>, failures: &mut Vec<ApiError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            error!(stage = e.stage(), error = %e, "upstream call failed");
            failures.push(e);
            None
        }
    }
}
