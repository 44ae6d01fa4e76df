//! Ops Desk server
//!
//! Tracks operational exceptions through their lifecycle, enforces SLA
//! deadlines with automatic escalation, and serves role-specific KPI views
//! over an HTTP/JSON API.
//!
//! ```text
//! opsdesk-server/src/
//! ├── lifecycle/   # pure creation + update engine
//! ├── db/          # SQLite repositories, transactional commits
//! ├── auth/        # JWT, role capabilities, auth middleware
//! ├── services/    # request workflows (validate, engine, commit)
//! ├── api/         # axum routes and handlers
//! ├── kpi.rs       # KPI aggregation
//! ├── dashboard.rs # supervisor / operational views
//! └── seed.rs      # demo data
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod kpi;
pub mod lifecycle;
pub mod logger;
pub mod seed;
pub mod services;
pub mod state;
pub mod util;

pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Security event log line on the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
