//! Login and session introspection

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::error::AppError;
use shared::models::{LoginRequest, LoginResponse, UserSummary};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::db::users;
use crate::error::internal;
use crate::security_log;
use crate::state::AppState;
use crate::util::{normalize_email, verify_password};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

/// Exchange email and password for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = normalize_email(&req.email);
    let user = users::find_by_email(&state.pool, &email)
        .await
        .map_err(internal)?;

    let Some(user) = user.filter(|u| verify_password(&req.password, &u.hashed_password)) else {
        security_log!("WARN", "login_failed", email = email.as_str());
        return Err(AppError::invalid_credentials());
    };

    let token = state.jwt.generate_token(&user).map_err(|e| {
        tracing::error!(error = %e, user_id = user.id, "Token generation failed");
        AppError::internal("Failed to issue token")
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.summary(),
    }))
}

/// The authenticated user's profile
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<UserSummary> {
    let user = users::find_by_id(&state.pool, current.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::user_not_found(current.id))?;
    Ok(Json(user.summary()))
}
