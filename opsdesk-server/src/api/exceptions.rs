//! Exception CRUD and lifecycle updates

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{
    ExceptionCreate, ExceptionDetail, ExceptionListItem, ExceptionQuery, ExceptionUpdate,
};
use shared::util::now_millis;

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::exceptions as service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/exceptions", get(list).post(create))
        .route(
            "/api/exceptions/{id}",
            get(get_one).patch(update).delete(delete),
        )
}

pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ExceptionQuery>,
) -> ApiResult<Vec<ExceptionListItem>> {
    let items = service::list(&state.pool, &current, query).await?;
    Ok(Json(items))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<ExceptionCreate>,
) -> Result<(StatusCode, Json<ExceptionDetail>), AppError> {
    let detail = service::create(&state.pool, &current, payload, now_millis()).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_one(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ExceptionDetail> {
    let detail = service::get(&state.pool, &current, id, now_millis()).await?;
    Ok(Json(detail))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ExceptionUpdate>,
) -> ApiResult<ExceptionDetail> {
    let detail = service::update(&state.pool, &current, id, payload, now_millis()).await?;
    Ok(Json(detail))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service::delete(&state.pool, &current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
