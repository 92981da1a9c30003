/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
///
/// `database` is `disconnected` (and `status` is `degraded`) when the pool
/// fails its probe, or `not_configured` when running on in-memory storage.

use crate::{app::AppState, error::ApiResult};
use ava_shared::db::pool::health_check as probe_database;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (status, database) = match &state.db {
        Some(pool) => match probe_database(pool).await {
            Ok(()) => ("healthy", "connected"),
            Err(e) => {
                tracing::warn!(error = %e, "Database health probe failed");
                ("degraded", "disconnected")
            }
        },
        None => ("healthy", "not_configured"),
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    }))
}
