//! KPI report, snapshots and metric history

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{KpiMetric, KpiReport, MetricType};
use shared::util::now_millis;

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::reports;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/kpis", get(report))
        .route("/api/kpis/snapshot", post(snapshot))
        .route("/api/kpis/history", get(history))
}

pub async fn report(State(state): State<AppState>, current: CurrentUser) -> ApiResult<KpiReport> {
    let report = reports::kpi_report(&state.pool, &current, now_millis()).await?;
    Ok(Json(report))
}

pub async fn snapshot(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<(StatusCode, Json<Vec<KpiMetric>>), AppError> {
    let rows = reports::record_snapshot(&state.pool, &current, now_millis()).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub metric_type: MetricType,
    pub limit: Option<i64>,
}

pub async fn history(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<KpiMetric>> {
    let rows =
        reports::metric_history(&state.pool, &current, query.metric_type, query.limit).await?;
    Ok(Json(rows))
}
