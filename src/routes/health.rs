/**
 * Health Routes
 * Liveness and persistence connectivity
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{db::Database, state::AppState};

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Response for GET /health
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub database: String,
    pub uptime: u64,
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health - liveness plus a connectivity flag for the database
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.database {
        Database::Memory => "in-memory",
        Database::Postgres(_) => match state.database.ping().await {
            Ok(_) => "connected",
            Err(e) => {
                tracing::warn!("Health check could not reach the database: {}", e);
                "disconnected"
            }
        },
    };

    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        environment: state.config.environment.as_str().to_string(),
        database: database.to_string(),
        uptime: SERVER_START.elapsed().as_secs(),
    })
}

/// GET /health/database - Database health check
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    let check = match state.database.ping().await {
        Ok(duration) => ServiceCheck {
            status: "healthy".to_string(),
            backend: state.database.kind().to_string(),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => ServiceCheck {
            status: "unhealthy".to_string(),
            backend: state.database.kind().to_string(),
            response_time: None,
            error: Some(e.to_string()),
        },
    };

    let status = if check.error.is_none() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(check))
}
