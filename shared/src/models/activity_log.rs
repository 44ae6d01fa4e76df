//! Activity Log Model

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::user::UserSummary;

/// Action tags written by the exception workflow
///
/// The stored `action` column is free text so manual entries (comments,
/// imported history) can carry other tags; this enum names the ones the
/// server produces itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Created,
    StatusUpdate,
    Resolved,
    Closed,
    Comment,
    Updated,
    Escalated,
    Reassigned,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::StatusUpdate => "STATUS_UPDATE",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
            Self::Comment => "COMMENT",
            Self::Updated => "UPDATED",
            Self::Escalated => "ESCALATED",
            Self::Reassigned => "REASSIGNED",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity log record (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ActivityLog {
    pub id: i64,
    pub exception_id: i64,
    pub user_id: i64,
    pub action: String,
    pub description: String,
    /// JSON object (flexible schema)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub metadata: serde_json::Value,
    pub created_at: i64,
}

/// Activity with its actor, newest-first in detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(flatten)]
    pub activity: ActivityLog,
    pub user: Option<UserSummary>,
}

/// Manual activity payload (comments, notes)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActivityCreate {
    #[validate(length(min = 1, max = 50, message = "action must be 1-50 characters"))]
    pub action: String,
    #[validate(length(min = 1, max = 2000, message = "description must be 1-2000 characters"))]
    pub description: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Defaults to the authenticated caller
    #[serde(default)]
    pub user_id: Option<i64>,
}
