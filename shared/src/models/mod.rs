//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps `i64` Unix millis.

pub mod activity_log;
pub mod escalation;
pub mod exception;
pub mod kpi;
pub mod sla;
pub mod user;

// Re-exports
pub use activity_log::*;
pub use escalation::*;
pub use exception::*;
pub use kpi::*;
pub use sla::*;
pub use user::*;
