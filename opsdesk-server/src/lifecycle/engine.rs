//! Update step of the exception workflow

use serde_json::json;
use shared::models::{ActivityAction, EscalationLevel, Exception, ExceptionStatus};
use shared::util::HOUR_MILLIS;

use super::{LifecycleOutcome, NewActivity, NewEscalation, UpdateRequest};

/// Age after which a LEVEL_2 exception that is still breached moves to LEVEL_3
pub const AUTO_ESCALATE_TO_LEVEL_3_AFTER_HOURS: i64 = 24;

/// Apply `request` to `current` at time `now`.
///
/// Re-evaluates the SLA first: a breached, non-terminal exception climbs
/// at most one escalation tier per call. Requested fields are then applied
/// on top, resolution bookkeeping runs when RESOLVED/CLOSED is requested,
/// and exactly one activity is synthesized. An empty request is a valid
/// "refresh"; on an already resolved exception it leaves `resolved_at` alone.
pub fn apply_update(current: &Exception, request: &UpdateRequest, now: i64) -> LifecycleOutcome {
    let breached = now > current.sla_deadline;

    let mut escalation_level = current.escalation_level;
    let mut escalated_status = None;
    let mut escalations = Vec::new();

    if breached
        && !current.status.is_terminal()
        && let Some(step) = next_escalation(current, now)
    {
        escalation_level = step.level;
        escalated_status = Some(ExceptionStatus::Escalated);
        escalations.push(step);
    }

    let status = request
        .desired_status
        .or(escalated_status)
        .unwrap_or(current.status);

    let mut exception = current.clone();
    exception.status = status;
    exception.escalation_level = escalation_level;
    if let Some(assignee) = request.desired_assignee_id {
        exception.assigned_to_id = Some(assignee);
    }
    if request.desired_status.is_some_and(|s| s.is_terminal()) {
        exception.resolved_at = Some(now);
        if let Some(notes) = &request.resolution_notes {
            exception.resolution_notes = Some(notes.clone());
        }
    }
    exception.updated_at = now;

    let activity = synthesize_activity(current, request, status, now);

    LifecycleOutcome {
        exception,
        escalations,
        activity,
    }
}

/// Escalation the SLA breach warrants, if any
fn next_escalation(current: &Exception, now: i64) -> Option<NewEscalation> {
    match current.escalation_level {
        EscalationLevel::Level1 => Some(NewEscalation {
            level: EscalationLevel::Level2,
            reason: "SLA deadline exceeded".to_string(),
            escalated_to: "Supervisor".to_string(),
            notes: Some("Auto-escalated due to SLA breach".to_string()),
            escalated_at: now,
        }),
        EscalationLevel::Level2
            if now > current.created_at + AUTO_ESCALATE_TO_LEVEL_3_AFTER_HOURS * HOUR_MILLIS =>
        {
            Some(NewEscalation {
                level: EscalationLevel::Level3,
                reason: "Unresolved after 24 hours at Level 2".to_string(),
                escalated_to: "Department Head".to_string(),
                notes: Some("Auto-escalated due to prolonged resolution time".to_string()),
                escalated_at: now,
            })
        }
        EscalationLevel::Level2 | EscalationLevel::Level3 => None,
    }
}

fn synthesize_activity(
    current: &Exception,
    request: &UpdateRequest,
    status: ExceptionStatus,
    now: i64,
) -> NewActivity {
    let status_touched = request.desired_status.is_some() || status != current.status;
    let reassigned = request
        .desired_assignee_id
        .is_some_and(|id| current.assigned_to_id != Some(id));

    let (action, description) = match request.desired_status {
        Some(ExceptionStatus::Closed) => (ActivityAction::Closed, "Exception closed".to_string()),
        Some(ExceptionStatus::Resolved) => (
            ActivityAction::Resolved,
            "Exception marked as resolved".to_string(),
        ),
        _ => {
            let action = if status_touched {
                ActivityAction::StatusUpdate
            } else {
                ActivityAction::Updated
            };
            let description = if reassigned {
                "Reassigned to new user".to_string()
            } else if status_touched {
                format!("Status changed to {status}")
            } else {
                "Exception updated".to_string()
            };
            (action, description)
        }
    };

    NewActivity {
        user_id: request.acting_user_id.unwrap_or(current.created_by_id),
        action,
        description,
        metadata: json!({
            "oldStatus": current.status,
            "newStatus": status,
        }),
        created_at: now,
    }
}
