//! Santa API Server library
//!
//! HTTP server for the Santa exchange: login, administrator user management,
//! generation runs and the participant reveal.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use state::AppState;

/// CORS layer for the configured origins
pub fn cors_layer(config: &config::CorsConfig) -> ServerResult<CorsLayer> {
    if config.allows_any() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                ServerError::Config(format!("Invalid CORS origin '{}': {}", origin, e))
            })
        })
        .collect::<ServerResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age)))
}

/// Build the full application router
pub fn build_router(state: AppState) -> ServerResult<Router> {
    let cors = cors_layer(&state.config.cors)?;

    Ok(Router::new()
        .nest(santa_api::paths::PREFIX, handlers::routes(&state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the Santa API server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    use std::net::SocketAddr;

    tracing::info!("Starting Santa API Server on {}", config.bind_address);
    if config.uses_default_secret() {
        tracing::warn!("Using the default JWT secret; set SANTA_JWT_SECRET before deploying");
    }

    // Parse address
    let addr: SocketAddr = config.bind_address.parse()?;

    let state = AppState::new(config).await?;
    let app = build_router(state)?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
