//! User directory (assignment pickers)

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::models::UserSummary;

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::db::users;
use crate::error::internal;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users", get(list))
}

pub async fn list(State(state): State<AppState>, _current: CurrentUser) -> ApiResult<Vec<UserSummary>> {
    let people = users::list_summaries(&state.pool).await.map_err(internal)?;
    Ok(Json(people))
}
