//! Application state

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::BoxError;
use crate::auth::JwtService;
use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Session token issuer/validator
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Open the database (migrations included) and build the token service
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = crate::db::connect(&config.database_url, config.db_max_connections).await?;
        Ok(Self::with_pool(
            pool,
            &config.jwt_secret,
            config.jwt_expiry_hours,
        ))
    }

    /// State over an existing pool (tests, embedding)
    pub fn with_pool(pool: SqlitePool, jwt_secret: &str, jwt_expiry_hours: i64) -> Self {
        Self {
            pool,
            jwt: Arc::new(JwtService::new(jwt_secret, jwt_expiry_hours)),
        }
    }
}
