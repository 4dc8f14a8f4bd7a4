//! Health check endpoint

use axum::{Json, extract::State};
use santa_api::responses::{ComponentStatus, HealthResponse, HealthStatus};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_status = match state.exchange.store().count_admins().await {
        Ok(_) => ComponentStatus::Ok,
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            ComponentStatus::Unavailable
        }
    };

    let status = match database_status {
        ComponentStatus::Ok => HealthStatus::Healthy,
        ComponentStatus::Unavailable => HealthStatus::Degraded,
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database_status,
    })
}
