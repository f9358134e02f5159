/// Kiosk weather server entry point
mod clients;
mod config;
mod derive;
mod domain;
mod errors;
mod handlers;
mod repo;
mod routes;
mod services;
mod utils;

use crate::clients::Upstreams;
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::repo::{ConfigStore, MemoryCache};
use crate::routes::build_router;
use crate::services::WeatherService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = AppConfig::from_env()?;
    info!(
        config_path = %config.location_config_path.display(),
        "Configuration loaded successfully"
    );

    let upstreams = Upstreams::new(&config.upstreams)?;
    let store = ConfigStore::new(config.location_config_path.clone());
    let weather_service = Arc::new(WeatherService::new(
        store,
        upstreams,
        Arc::new(MemoryCache::new()),
    ));

    if config.cache_warm_seconds > 0 {
        start_cache_warmer(weather_service.clone(), config.cache_warm_seconds);
    }

    let app = build_router(AppState { weather_service });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("weather server listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Periodically run the pipeline so the Freshness Cache is warm between polls
fn start_cache_warmer(service: Arc<WeatherService>, interval: u64) {
    tokio::spawn(async move {
        info!("Starting cache warm task (interval: {}s)", interval);
        loop {
            match service.get_weather().await {
                Ok(payload) if payload.stale == Some(true) => {
                    warn!("cache warm run fell back to stale data")
                }
                Ok(_) => {}
                Err(e) => warn!("cache warm run failed: {}", e),
            }
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    });
}
