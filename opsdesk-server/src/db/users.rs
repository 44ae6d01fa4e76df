//! User queries

use shared::models::{User, UserSummary};
use sqlx::{SqliteConnection, SqlitePool};

use crate::BoxError;

const USER_COLUMNS: &str = "id, email, name, role, avatar, hashed_password, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, BoxError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Lookup by email; callers pass the normalized (lowercase) form
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, BoxError> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, BoxError> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// All users, ordered by name
pub async fn list_summaries(pool: &SqlitePool) -> Result<Vec<UserSummary>, BoxError> {
    let rows = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email, role, avatar FROM users ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, BoxError> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn insert(conn: &mut SqliteConnection, user: &User) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO users (id, email, name, role, avatar, hashed_password, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.role)
    .bind(&user.avatar)
    .bind(&user.hashed_password)
    .bind(user.created_at)
    .execute(conn)
    .await?;
    Ok(())
}
