//! Exception workflows: list, read, create, update, delete, activity feed

use shared::error::AppError;
use shared::models::{
    ActivityCreate, ActivityEntry, ActivityLog, Exception, ExceptionCreate, ExceptionDetail,
    ExceptionListItem, ExceptionQuery, ExceptionStatus, ExceptionUpdate,
};
use shared::util::snowflake_id;
use sqlx::SqlitePool;

use super::validate_payload;
use crate::auth::{Capability, CurrentUser, ListScope};
use crate::db::exceptions::ExceptionFilter;
use crate::db::{activities, exceptions, users};
use crate::error::ServiceResult;
use crate::lifecycle::{NewException, UpdateRequest, apply_update, new_exception};

/// `UserNotFound` unless `id` exists
async fn ensure_user(pool: &SqlitePool, id: i64) -> ServiceResult<()> {
    if users::exists(pool, id).await? {
        Ok(())
    } else {
        Err(AppError::user_not_found(id).into())
    }
}

/// Load an exception the caller may see
async fn load_visible(pool: &SqlitePool, caller: &CurrentUser, id: i64) -> ServiceResult<Exception> {
    let exception = exceptions::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::exception_not_found(id))?;
    caller.require_view(&exception)?;
    Ok(exception)
}

async fn detail(pool: &SqlitePool, id: i64, now: i64) -> ServiceResult<ExceptionDetail> {
    exceptions::load_detail(pool, id, now)
        .await?
        .ok_or_else(|| AppError::exception_not_found(id).into())
}

/// Scoped list, newest first
pub async fn list(
    pool: &SqlitePool,
    caller: &CurrentUser,
    query: ExceptionQuery,
) -> ServiceResult<Vec<ExceptionListItem>> {
    let status = query.status.as_deref().map(str::parse).transpose()?;
    let severity = query.severity.as_deref().map(str::parse).transpose()?;

    let Some(assigned_to) = ListScope::for_user(caller).assignee_filter(query.assigned_to) else {
        return Ok(Vec::new());
    };
    let filter = ExceptionFilter {
        status,
        severity,
        assigned_to,
    };
    Ok(exceptions::list_items(pool, &filter).await?)
}

pub async fn get(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    now: i64,
) -> ServiceResult<ExceptionDetail> {
    load_visible(pool, caller, id).await?;
    detail(pool, id, now).await
}

/// Open a new exception; creator and assignee must exist
pub async fn create(
    pool: &SqlitePool,
    caller: &CurrentUser,
    payload: ExceptionCreate,
    now: i64,
) -> ServiceResult<ExceptionDetail> {
    validate_payload(&payload)?;
    let input = NewException::from_payload(payload, caller.id)?;

    ensure_user(pool, input.created_by_id).await?;
    if let Some(assignee) = input.assigned_to_id {
        ensure_user(pool, assignee).await?;
    }

    let (exception, activity) = new_exception(snowflake_id(), input, now)?;
    let activity = activity.into_record(snowflake_id(), exception.id);
    exceptions::commit_create(pool, &exception, &activity).await?;

    tracing::info!(
        exception_id = exception.id,
        severity = %exception.severity,
        escalation_level = %exception.escalation_level,
        created_by = exception.created_by_id,
        "Exception created"
    );
    detail(pool, exception.id, now).await
}

/// Run one lifecycle step against the stored exception and commit it
pub async fn update(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    payload: ExceptionUpdate,
    now: i64,
) -> ServiceResult<ExceptionDetail> {
    validate_payload(&payload)?;
    let current = load_visible(pool, caller, id).await?;

    let desired_status: Option<ExceptionStatus> =
        payload.status.as_deref().map(str::parse).transpose()?;
    if let Some(assignee) = payload.assigned_to_id {
        ensure_user(pool, assignee).await?;
    }
    let acting_user_id = payload.user_id.unwrap_or(caller.id);
    if acting_user_id != caller.id {
        ensure_user(pool, acting_user_id).await?;
    }

    let request = UpdateRequest {
        desired_status,
        desired_assignee_id: payload.assigned_to_id,
        resolution_notes: payload.resolution_notes,
        acting_user_id: Some(acting_user_id),
    };
    let outcome = apply_update(&current, &request, now);

    if !exceptions::commit_update(pool, &outcome).await? {
        return Err(AppError::exception_not_found(id).into());
    }

    for escalation in &outcome.escalations {
        tracing::info!(
            exception_id = id,
            level = %escalation.level,
            escalated_to = %escalation.escalated_to,
            reason = %escalation.reason,
            "Exception auto-escalated"
        );
    }
    tracing::debug!(
        exception_id = id,
        status = %outcome.exception.status,
        action = %outcome.activity.action,
        "Exception updated"
    );

    detail(pool, id, now).await
}

/// Remove an exception with its history
pub async fn delete(pool: &SqlitePool, caller: &CurrentUser, id: i64) -> ServiceResult<()> {
    caller.require(Capability::DeleteExceptions)?;
    if !exceptions::delete(pool, id).await? {
        return Err(AppError::exception_not_found(id).into());
    }
    crate::security_log!("INFO", "exception_deleted", user_id = caller.id, exception_id = id);
    Ok(())
}

/// Activity feed of one exception, newest first
pub async fn list_activities(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
) -> ServiceResult<Vec<ActivityEntry>> {
    load_visible(pool, caller, id).await?;
    Ok(activities::list_for_exception(pool, id).await?)
}

/// Append a manual activity (comments and the like)
pub async fn add_activity(
    pool: &SqlitePool,
    caller: &CurrentUser,
    id: i64,
    payload: ActivityCreate,
    now: i64,
) -> ServiceResult<ActivityEntry> {
    validate_payload(&payload)?;
    load_visible(pool, caller, id).await?;

    let user_id = payload.user_id.unwrap_or(caller.id);
    if user_id != caller.id {
        ensure_user(pool, user_id).await?;
    }

    let activity = ActivityLog {
        id: snowflake_id(),
        exception_id: id,
        user_id,
        action: payload.action.trim().to_uppercase(),
        description: payload.description,
        metadata: payload
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        created_at: now,
    };
    let mut conn = pool.acquire().await?;
    activities::insert(&mut *conn, &activity).await?;
    drop(conn);

    activities::find_entry(pool, activity.id)
        .await?
        .ok_or_else(|| AppError::not_found("Activity").into())
}
