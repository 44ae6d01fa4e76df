//! Activity log (append-only)

use shared::models::{ActivityEntry, ActivityLog, RecentActivity, UserRole, UserSummary};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::BoxError;

pub async fn insert(conn: &mut SqliteConnection, activity: &ActivityLog) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO activity_logs (id, exception_id, user_id, action, description, metadata, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(activity.id)
    .bind(activity.exception_id)
    .bind(activity.user_id)
    .bind(&activity.action)
    .bind(&activity.description)
    .bind(sqlx::types::Json(&activity.metadata))
    .bind(activity.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Activity joined with its actor (LEFT JOIN, actor columns nullable)
#[derive(sqlx::FromRow)]
struct ActivityRow {
    #[sqlx(flatten)]
    activity: ActivityLog,
    user_name: Option<String>,
    user_email: Option<String>,
    user_role: Option<UserRole>,
    user_avatar: Option<String>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        let user = match (row.user_name, row.user_email, row.user_role) {
            (Some(name), Some(email), Some(role)) => Some(UserSummary {
                id: row.activity.user_id,
                name,
                email,
                role,
                avatar: row.user_avatar,
            }),
            _ => None,
        };
        ActivityEntry {
            activity: row.activity,
            user,
        }
    }
}

/// Activities of one exception with their actors, newest first
pub async fn list_for_exception(
    pool: &SqlitePool,
    exception_id: i64,
) -> Result<Vec<ActivityEntry>, BoxError> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT a.id, a.exception_id, a.user_id, a.action, a.description, a.metadata, a.created_at, \
                u.name AS user_name, u.email AS user_email, u.role AS user_role, u.avatar AS user_avatar \
         FROM activity_logs a LEFT JOIN users u ON u.id = a.user_id \
         WHERE a.exception_id = ? \
         ORDER BY a.created_at DESC, a.id DESC",
    )
    .bind(exception_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(ActivityEntry::from).collect())
}

pub async fn find_entry(pool: &SqlitePool, id: i64) -> Result<Option<ActivityEntry>, BoxError> {
    let row = sqlx::query_as::<_, ActivityRow>(
        "SELECT a.id, a.exception_id, a.user_id, a.action, a.description, a.metadata, a.created_at, \
                u.name AS user_name, u.email AS user_email, u.role AS user_role, u.avatar AS user_avatar \
         FROM activity_logs a LEFT JOIN users u ON u.id = a.user_id \
         WHERE a.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(ActivityEntry::from))
}

/// Activity counts keyed by exception id (exceptions without rows are absent)
pub async fn count_by_exception(
    pool: &SqlitePool,
    exception_ids: &[i64],
) -> Result<Vec<(i64, i64)>, BoxError> {
    if exception_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT exception_id, COUNT(*) FROM activity_logs WHERE exception_id IN (",
    );
    let mut ids = qb.separated(", ");
    for id in exception_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") GROUP BY exception_id");

    let rows = qb.build_query_as::<(i64, i64)>().fetch_all(pool).await?;
    Ok(rows)
}

/// The `limit` newest activities across all exceptions
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<RecentActivity>, BoxError> {
    let rows = sqlx::query_as::<_, RecentActivity>(
        "SELECT a.id, a.exception_id, e.title AS exception_title, a.user_id, \
                u.name AS user_name, a.action, a.description, a.created_at \
         FROM activity_logs a \
         JOIN exceptions e ON e.id = a.exception_id \
         LEFT JOIN users u ON u.id = a.user_id \
         ORDER BY a.created_at DESC, a.id DESC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
