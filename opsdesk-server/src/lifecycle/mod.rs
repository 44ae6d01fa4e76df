//! Exception lifecycle
//!
//! Pure state transitions for exceptions: creation ([`new_exception`]) and
//! the update step ([`apply_update`]) that re-evaluates the SLA, escalates
//! overdue work and records exactly one activity per call. Nothing here
//! touches the clock or the database; callers pass `now` and persist the
//! returned records in one transaction.

mod create;
mod engine;
#[cfg(test)]
mod tests;

pub use create::{DEFAULT_IMPACT_LEVEL, DEFAULT_SLA_HOURS, NewException, new_exception};
pub use engine::{AUTO_ESCALATE_TO_LEVEL_3_AFTER_HOURS, apply_update};

use serde_json::Value;
use shared::models::{
    ActivityAction, ActivityLog, Escalation, EscalationLevel, Exception, ExceptionStatus,
};

/// Desired changes for one update call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub desired_status: Option<ExceptionStatus>,
    pub desired_assignee_id: Option<i64>,
    pub resolution_notes: Option<String>,
    /// Recorded as the activity actor; the creator when absent
    pub acting_user_id: Option<i64>,
}

/// Escalation record produced by the engine, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewEscalation {
    pub level: EscalationLevel,
    pub reason: String,
    pub escalated_to: String,
    pub notes: Option<String>,
    pub escalated_at: i64,
}

impl NewEscalation {
    pub fn into_record(self, id: i64, exception_id: i64) -> Escalation {
        Escalation {
            id,
            exception_id,
            level: self.level,
            reason: self.reason,
            escalated_to: self.escalated_to,
            notes: self.notes,
            escalated_at: self.escalated_at,
        }
    }
}

/// Activity record produced by the engine, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub user_id: i64,
    pub action: ActivityAction,
    pub description: String,
    pub metadata: Value,
    pub created_at: i64,
}

impl NewActivity {
    pub fn into_record(self, id: i64, exception_id: i64) -> ActivityLog {
        ActivityLog {
            id,
            exception_id,
            user_id: self.user_id,
            action: self.action.as_str().to_string(),
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

/// Result of one update call: the new exception state plus the history
/// rows that must be committed with it
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleOutcome {
    pub exception: Exception,
    /// Zero or one in practice
    pub escalations: Vec<NewEscalation>,
    pub activity: NewActivity,
}

impl LifecycleOutcome {
    pub fn escalated(&self) -> bool {
        !self.escalations.is_empty()
    }
}
