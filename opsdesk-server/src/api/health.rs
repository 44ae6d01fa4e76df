//! Liveness with a database round trip (public)

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    database: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match crate::db::ping(&state.pool).await {
        Ok(()) => ("ok", StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, "Health check database ping failed");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };
    (
        code,
        Json(HealthResponse {
            status,
            service: "opsdesk-server",
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
