/// Application routes configuration
use crate::handlers::{get_background, get_weather, health, AppState};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/weather", get(get_weather))
        .route("/background", get(get_background))
        .with_state(state)
}
