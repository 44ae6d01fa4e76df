//! Server configuration

use crate::BoxError;

const DEFAULT_DATABASE_URL: &str = "sqlite:opsdesk.db";

/// Server configuration, loaded from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub jwt_expiry_hours: i64,
    /// Insert the demo users and exceptions into an empty database
    pub seed_demo_data: bool,
    /// Tracing filter directive (LOG_LEVEL, falls back to RUST_LOG)
    pub log_level: Option<String>,
    /// Directory for daily-rolling log files
    pub log_dir: Option<String>,
    /// Upper bound of the SQLite pool
    pub db_max_connections: u32,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(
        name: &str,
        value: Option<String>,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match value {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self::from_lookup(&environment, |name| std::env::var(name).ok())
    }

    fn from_lookup(
        environment: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, BoxError> {
        let is_development = environment == "development";

        let jwt_secret = Self::require_secret("JWT_SECRET", lookup("JWT_SECRET"), environment)?;

        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| format!("SEED_DEMO_DATA must be true or false, got {v:?}"))?,
            None => is_development,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            http_port: lookup("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: environment.to_string(),
            jwt_secret,
            jwt_expiry_hours: lookup("JWT_EXPIRY_HOURS")
                .and_then(|h| h.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(24),
            seed_demo_data,
            log_level: lookup("LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .filter(|s| !s.is_empty()),
            log_dir: lookup("LOG_DIR").filter(|s| !s.is_empty()),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(5),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
