//! Escalation Model

use serde::{Deserialize, Serialize};

use super::exception::EscalationLevel;

/// Escalation record (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Escalation {
    pub id: i64,
    pub exception_id: i64,
    /// Level escalated *to*
    pub level: EscalationLevel,
    pub reason: String,
    /// Role or person the exception was handed to
    pub escalated_to: String,
    pub notes: Option<String>,
    pub escalated_at: i64,
}
