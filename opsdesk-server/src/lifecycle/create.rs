//! Creation step of the exception workflow

use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ActivityAction, Exception, ExceptionCreate, ExceptionStatus, Severity};
use shared::util::HOUR_MILLIS;

use super::NewActivity;

pub const DEFAULT_IMPACT_LEVEL: i32 = 3;
pub const DEFAULT_SLA_HOURS: i64 = 24;

/// Typed creation input
#[derive(Debug, Clone, PartialEq)]
pub struct NewException {
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub impact_level: Option<i32>,
    pub assigned_to_id: Option<i64>,
    pub sla_deadline: Option<i64>,
    pub created_by_id: i64,
}

impl NewException {
    /// Parse a wire payload; `caller_id` stands in for a missing creator
    pub fn from_payload(payload: ExceptionCreate, caller_id: i64) -> AppResult<Self> {
        Ok(Self {
            severity: payload.severity.parse()?,
            title: payload.title,
            description: payload.description,
            category: payload.category,
            impact_level: payload.impact_level,
            assigned_to_id: payload.assigned_to_id,
            sla_deadline: payload.sla_deadline,
            created_by_id: payload.created_by_id.unwrap_or(caller_id),
        })
    }
}

/// Build a fresh OPEN exception and its CREATED activity
pub fn new_exception(id: i64, input: NewException, now: i64) -> AppResult<(Exception, NewActivity)> {
    for (field, value) in [
        ("title", &input.title),
        ("description", &input.description),
        ("category", &input.category),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                format!("{field} is required"),
            )
            .with_detail("field", field));
        }
    }

    let impact_level = input.impact_level.unwrap_or(DEFAULT_IMPACT_LEVEL);
    if !(1..=5).contains(&impact_level) {
        return Err(AppError::new(ErrorCode::InvalidImpactLevel).with_detail("value", impact_level));
    }

    let exception = Exception {
        id,
        title: input.title,
        description: input.description,
        category: input.category,
        severity: input.severity,
        impact_level,
        status: ExceptionStatus::Open,
        escalation_level: input.severity.initial_escalation_level(),
        sla_deadline: input
            .sla_deadline
            .unwrap_or(now + DEFAULT_SLA_HOURS * HOUR_MILLIS),
        resolved_at: None,
        resolution_notes: None,
        assigned_to_id: input.assigned_to_id,
        created_by_id: input.created_by_id,
        created_at: now,
        updated_at: now,
    };

    let activity = NewActivity {
        user_id: exception.created_by_id,
        action: ActivityAction::Created,
        description: format!("Exception created: {}", exception.title),
        metadata: json!({
            "severity": exception.severity,
            "category": exception.category,
        }),
        created_at: now,
    };

    Ok((exception, activity))
}
