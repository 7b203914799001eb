//! Health check endpoints for Kubernetes probes and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// "ok" or "unhealthy"
    pub status: &'static str,
    pub version: &'static str,
    /// Present only when a database is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<ComponentStatus>,
    pub divergence: DivergenceStatus,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    pub latency_ms: u64,
}

/// Shadow comparison state. Zero mismatches over a soak period means a
/// category is safe to cut over.
#[derive(Debug, Serialize)]
pub struct DivergenceStatus {
    pub enabled: bool,
    pub total_mismatches: u64,
}

#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db {
        Some(db) => {
            let start = std::time::Instant::now();
            let healthy = db.health_check().await.is_ok();
            Some(ComponentStatus {
                healthy,
                latency_ms: start.elapsed().as_millis() as u64,
            })
        }
        None => None,
    };

    let healthy = database.as_ref().is_none_or(|d| d.healthy);
    let body = HealthStatus {
        status: if healthy { "ok" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        divergence: DivergenceStatus {
            enabled: state.divergence.is_enabled(),
            total_mismatches: state.divergence.total_mismatches(),
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Kubernetes liveness probe.
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// Kubernetes readiness probe. Not ready while the database is unreachable.
#[tracing::instrument(name = "health.readiness", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(db) = &state.db
        && db.health_check().await.is_err()
    {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    StatusCode::OK
}
