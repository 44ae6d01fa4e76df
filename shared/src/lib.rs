//! Shared types for Ops Desk
//!
//! Domain types used by the server and by API clients: the exception
//! workflow enums and entities, request payloads, KPI report structures,
//! and the unified error system.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
