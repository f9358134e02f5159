/// HTTP request handlers
use crate::domain::{BackgroundPhase, Health, WeatherPayload};
use crate::errors::ApiError;
use crate::services::WeatherService;
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub weather_service: Arc<WeatherService>,
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
        cache: state.weather_service.cache_status(),
    })
}

/// Aggregated weather for the display, fresh or stale
pub async fn get_weather(State(state): State<AppState>) -> Result<Json<WeatherPayload>, ApiError> {
    let payload = state.weather_service.get_weather().await?;
    Ok(Json(payload))
}

/// Day/night background hint
pub async fn get_background(State(state): State<AppState>) -> Json<BackgroundPhase> {
    Json(state.weather_service.background_phase())
}
