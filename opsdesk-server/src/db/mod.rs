//! Database Module
//!
//! SQLite connection pool, embedded migrations and the repository
//! functions for each table.

pub mod activities;
pub mod escalations;
pub mod exceptions;
pub mod kpi_metrics;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::BoxError;

/// Open the database at `url` (WAL, foreign keys on) and apply migrations
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, BoxError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| format!("Invalid database url {url}: {e}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    tracing::info!(max_connections, "Database connection established (SQLite WAL)");

    migrate(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with migrations applied.
///
/// Every connection to `sqlite::memory:` is a separate database, so the
/// pool is pinned to one connection that is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool, BoxError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), BoxError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("Database migrations applied");
    Ok(())
}

/// Round-trip query used by the health check
pub async fn ping(pool: &SqlitePool) -> Result<(), BoxError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
