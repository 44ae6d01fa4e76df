use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::models::DashboardResponse;
use shared::util::now_millis;

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::reports;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}

/// Role-conditioned dashboard for the caller
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<DashboardResponse> {
    let response = reports::dashboard(&state.pool, &current, now_millis()).await?;
    Ok(Json(response))
}
