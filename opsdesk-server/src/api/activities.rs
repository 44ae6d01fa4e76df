//! Per-exception activity feed

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{ActivityCreate, ActivityEntry};
use shared::util::now_millis;

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::exceptions as service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/exceptions/{id}/activities", get(list).post(create))
}

pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ActivityEntry>> {
    let entries = service::list_activities(&state.pool, &current, id).await?;
    Ok(Json(entries))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActivityCreate>,
) -> Result<(StatusCode, Json<ActivityEntry>), AppError> {
    let entry = service::add_activity(&state.pool, &current, id, payload, now_millis()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
