//! Liveness probe for load balancers and deploy checks.
//!
//! Answers 200 even when Postgres is down. The body reports whether the pool
//! can reach it.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `degraded` when `SELECT 1` fails on the pool.
    pub status: &'static str,
    /// Version of the serving binary.
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = wikitree_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// Mounted beside `/api/v1`, outside auth and the body limits.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
