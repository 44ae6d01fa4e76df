//! Escalation history (append-only)

use shared::models::Escalation;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::BoxError;

const ESCALATION_COLUMNS: &str =
    "id, exception_id, level, reason, escalated_to, notes, escalated_at";

pub async fn insert(conn: &mut SqliteConnection, escalation: &Escalation) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO escalations (id, exception_id, level, reason, escalated_to, notes, escalated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(escalation.id)
    .bind(escalation.exception_id)
    .bind(escalation.level)
    .bind(&escalation.reason)
    .bind(&escalation.escalated_to)
    .bind(&escalation.notes)
    .bind(escalation.escalated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Newest first
pub async fn list_for_exception(
    pool: &SqlitePool,
    exception_id: i64,
) -> Result<Vec<Escalation>, BoxError> {
    let rows = sqlx::query_as::<_, Escalation>(&format!(
        "SELECT {ESCALATION_COLUMNS} FROM escalations WHERE exception_id = ? \
         ORDER BY escalated_at DESC, id DESC"
    ))
    .bind(exception_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Escalations of several exceptions, newest first
pub async fn list_for_exceptions(
    pool: &SqlitePool,
    exception_ids: &[i64],
) -> Result<Vec<Escalation>, BoxError> {
    if exception_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {ESCALATION_COLUMNS} FROM escalations WHERE exception_id IN ("
    ));
    let mut ids = qb.separated(", ");
    for id in exception_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY escalated_at DESC, id DESC");

    let rows = qb.build_query_as::<Escalation>().fetch_all(pool).await?;
    Ok(rows)
}
