//! Exception Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::activity_log::ActivityEntry;
use super::escalation::Escalation;
use super::sla::SlaState;
use super::user::UserSummary;
use crate::error::{AppError, ErrorCode};

/// Workflow status of an exception
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ExceptionStatus {
    Open,
    InProgress,
    Waiting,
    Escalated,
    Resolved,
    Closed,
}

impl ExceptionStatus {
    pub const ALL: [ExceptionStatus; 6] = [
        Self::Open,
        Self::InProgress,
        Self::Waiting,
        Self::Escalated,
        Self::Resolved,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Waiting => "WAITING",
            Self::Escalated => "ESCALATED",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }

    /// RESOLVED or CLOSED: work on the exception has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExceptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::with_message(ErrorCode::InvalidStatus, format!("Unknown status: {s}"))
                    .with_detail("value", s)
            })
    }
}

/// Severity of an exception
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Escalation tier an exception of this severity starts at
    pub fn initial_escalation_level(&self) -> EscalationLevel {
        match self {
            Self::Critical => EscalationLevel::Level2,
            _ => EscalationLevel::Level1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::InvalidSeverity,
                    format!("Unknown severity: {s}"),
                )
                .with_detail("value", s)
            })
    }
}

/// Escalation tier: 1 = operational, 2 = supervisor, 3 = department head
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum EscalationLevel {
    #[serde(rename = "LEVEL_1")]
    #[cfg_attr(feature = "db", sqlx(rename = "LEVEL_1"))]
    Level1,
    #[serde(rename = "LEVEL_2")]
    #[cfg_attr(feature = "db", sqlx(rename = "LEVEL_2"))]
    Level2,
    #[serde(rename = "LEVEL_3")]
    #[cfg_attr(feature = "db", sqlx(rename = "LEVEL_3"))]
    Level3,
}

impl EscalationLevel {
    pub const ALL: [EscalationLevel; 3] = [Self::Level1, Self::Level2, Self::Level3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Level1 => "LEVEL_1",
            Self::Level2 => "LEVEL_2",
            Self::Level3 => "LEVEL_3",
        }
    }

    /// Next tier up, `None` at the top of the hierarchy
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Level1 => Some(Self::Level2),
            Self::Level2 => Some(Self::Level3),
            Self::Level3 => None,
        }
    }

    /// Human label used by dashboards
    pub fn label(&self) -> &'static str {
        match self {
            Self::Level1 => "Level 1 - Operational",
            Self::Level2 => "Level 2 - Supervisor",
            Self::Level3 => "Level 3 - Department Head",
        }
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscalationLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::InvalidEscalationLevel,
                    format!("Unknown escalation level: {s}"),
                )
                .with_detail("value", s)
            })
    }
}

/// Exception entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Exception {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Free-text category (Infrastructure, Payment, ...)
    pub category: String,
    pub severity: Severity,
    /// 1 (minor) ..= 5 (severe)
    pub impact_level: i32,
    pub status: ExceptionStatus,
    pub escalation_level: EscalationLevel,
    pub sla_deadline: i64,
    /// Set whenever the exception enters RESOLVED/CLOSED; never cleared
    pub resolved_at: Option<i64>,
    pub resolution_notes: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub created_by_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Exception {
    /// SLA deadline has passed at `now`
    pub fn is_breached_at(&self, now: i64) -> bool {
        now > self.sla_deadline
    }
}

/// Create exception payload
///
/// Enum-valued fields arrive as strings and are parsed by the handler so an
/// unknown value becomes a workflow validation error instead of a body
/// rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExceptionCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "description must be 1-5000 characters"))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "category must be 1-100 characters"))]
    pub category: String,
    pub severity: String,
    #[serde(default)]
    pub impact_level: Option<i32>,
    #[serde(default)]
    pub assigned_to_id: Option<i64>,
    /// Defaults to creation time + 24h
    #[serde(default)]
    pub sla_deadline: Option<i64>,
    /// Defaults to the authenticated caller
    #[serde(default)]
    pub created_by_id: Option<i64>,
}

/// Update exception payload (PATCH)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExceptionUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to_id: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 5000, message = "resolution_notes must be at most 5000 characters"))]
    pub resolution_notes: Option<String>,
    /// Acting user; defaults to the authenticated caller
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// List filters (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExceptionQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub assigned_to: Option<i64>,
}

/// Exception row in list views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionListItem {
    #[serde(flatten)]
    pub exception: Exception,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    /// Newest first
    pub escalations: Vec<Escalation>,
    pub activity_count: i64,
}

/// Exception with all relations, as returned by detail and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionDetail {
    #[serde(flatten)]
    pub exception: Exception,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    /// Newest first
    pub escalations: Vec<Escalation>,
    /// Newest first
    pub activities: Vec<ActivityEntry>,
    pub sla: SlaState,
}
