use shared::error::ErrorCode;
use shared::models::{ActivityAction, EscalationLevel, Exception, ExceptionStatus, Severity};
use shared::util::HOUR_MILLIS;

use super::*;

const NOW: i64 = 1_760_000_000_000;
const CREATOR: i64 = 100;
const OPERATOR: i64 = 200;

fn exception(status: ExceptionStatus, level: EscalationLevel) -> Exception {
    Exception {
        id: 1,
        title: "Payment gateway timeout".to_string(),
        description: "Checkout requests failing".to_string(),
        category: "Payment".to_string(),
        severity: Severity::High,
        impact_level: 4,
        status,
        escalation_level: level,
        sla_deadline: NOW + 4 * HOUR_MILLIS,
        resolved_at: None,
        resolution_notes: None,
        assigned_to_id: Some(OPERATOR),
        created_by_id: CREATOR,
        created_at: NOW - 2 * HOUR_MILLIS,
        updated_at: NOW - 2 * HOUR_MILLIS,
    }
}

fn breached(mut e: Exception) -> Exception {
    e.sla_deadline = NOW - HOUR_MILLIS;
    e
}

fn status(s: ExceptionStatus) -> UpdateRequest {
    UpdateRequest {
        desired_status: Some(s),
        ..Default::default()
    }
}

fn creation_input(severity: Severity) -> NewException {
    NewException {
        title: "Database connection pool exhausted".to_string(),
        description: "API returning 503".to_string(),
        category: "Infrastructure".to_string(),
        severity,
        impact_level: None,
        assigned_to_id: None,
        sla_deadline: None,
        created_by_id: CREATOR,
    }
}

// ========== SLA auto-escalation ==========

#[test]
fn test_breached_level_1_escalates_to_level_2() {
    let current = breached(exception(ExceptionStatus::Open, EscalationLevel::Level1));
    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);

    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level2);
    assert_eq!(outcome.exception.status, ExceptionStatus::Escalated);
    assert_eq!(outcome.escalations.len(), 1);

    let escalation = &outcome.escalations[0];
    assert_eq!(escalation.level, EscalationLevel::Level2);
    assert_eq!(escalation.reason, "SLA deadline exceeded");
    assert_eq!(escalation.escalated_to, "Supervisor");
    assert_eq!(
        escalation.notes.as_deref(),
        Some("Auto-escalated due to SLA breach")
    );
    assert_eq!(escalation.escalated_at, NOW);
}

#[test]
fn test_refresh_that_escalates_reports_status_update() {
    let current = breached(exception(ExceptionStatus::Open, EscalationLevel::Level1));
    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);

    assert_eq!(outcome.activity.action, ActivityAction::StatusUpdate);
    assert_eq!(outcome.activity.description, "Status changed to ESCALATED");
    assert_eq!(outcome.activity.metadata["oldStatus"], "OPEN");
    assert_eq!(outcome.activity.metadata["newStatus"], "ESCALATED");
}

#[test]
fn test_level_2_escalates_after_24_hours() {
    let mut current = breached(exception(ExceptionStatus::InProgress, EscalationLevel::Level2));
    current.created_at = NOW - 25 * HOUR_MILLIS;

    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);

    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level3);
    assert_eq!(outcome.exception.status, ExceptionStatus::Escalated);
    assert_eq!(outcome.escalations.len(), 1);
    assert_eq!(outcome.escalations[0].level, EscalationLevel::Level3);
    assert_eq!(
        outcome.escalations[0].reason,
        "Unresolved after 24 hours at Level 2"
    );
    assert_eq!(outcome.escalations[0].escalated_to, "Department Head");
}

#[test]
fn test_level_2_within_24_hours_holds() {
    let current = breached(exception(ExceptionStatus::InProgress, EscalationLevel::Level2));
    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);

    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level2);
    assert_eq!(outcome.exception.status, ExceptionStatus::InProgress);
    assert!(outcome.escalations.is_empty());
    assert_eq!(outcome.activity.action, ActivityAction::Updated);
}

#[test]
fn test_level_2_exactly_24_hours_old_holds() {
    let mut current = breached(exception(ExceptionStatus::Open, EscalationLevel::Level2));
    current.created_at = NOW - 24 * HOUR_MILLIS;

    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);
    assert!(!outcome.escalated());
}

#[test]
fn test_level_3_is_the_ceiling() {
    let mut current = breached(exception(ExceptionStatus::Escalated, EscalationLevel::Level3));
    current.created_at = NOW - 72 * HOUR_MILLIS;

    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);
    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level3);
    assert!(outcome.escalations.is_empty());
}

#[test]
fn test_deadline_equal_to_now_is_not_breached() {
    let mut current = exception(ExceptionStatus::Open, EscalationLevel::Level1);
    current.sla_deadline = NOW;

    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);
    assert!(outcome.escalations.is_empty());
    assert_eq!(outcome.exception.status, ExceptionStatus::Open);
}

#[test]
fn test_terminal_statuses_never_auto_escalate() {
    for terminal in [ExceptionStatus::Resolved, ExceptionStatus::Closed] {
        for level in [EscalationLevel::Level1, EscalationLevel::Level2] {
            let mut current = breached(exception(terminal, level));
            current.created_at = NOW - 48 * HOUR_MILLIS;

            let outcome = apply_update(&current, &UpdateRequest::default(), NOW);
            assert_eq!(outcome.exception.escalation_level, level);
            assert_eq!(outcome.exception.status, terminal);
            assert!(outcome.escalations.is_empty());
        }
    }
}

#[test]
fn test_explicit_status_wins_over_auto_escalation() {
    let current = breached(exception(ExceptionStatus::Open, EscalationLevel::Level1));
    let outcome = apply_update(&current, &status(ExceptionStatus::InProgress), NOW);

    // level still climbs, but the caller's status is kept
    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level2);
    assert_eq!(outcome.exception.status, ExceptionStatus::InProgress);
    assert_eq!(outcome.escalations.len(), 1);
    assert_eq!(outcome.activity.description, "Status changed to IN_PROGRESS");
}

#[test]
fn test_resolving_a_breached_exception_still_escalates_first() {
    let current = breached(exception(ExceptionStatus::Open, EscalationLevel::Level1));
    let outcome = apply_update(&current, &status(ExceptionStatus::Resolved), NOW);

    assert_eq!(outcome.exception.status, ExceptionStatus::Resolved);
    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level2);
    assert_eq!(outcome.escalations.len(), 1);
    assert_eq!(outcome.activity.action, ActivityAction::Resolved);
}

#[test]
fn test_escalation_level_never_decreases() {
    let levels = [
        EscalationLevel::Level1,
        EscalationLevel::Level2,
        EscalationLevel::Level3,
    ];
    for level in levels {
        for s in ExceptionStatus::ALL {
            let mut current = breached(exception(s, level));
            current.created_at = NOW - 30 * HOUR_MILLIS;
            for request in [UpdateRequest::default(), status(ExceptionStatus::Open)] {
                let outcome = apply_update(&current, &request, NOW);
                assert!(outcome.exception.escalation_level >= level);
                assert!(outcome.escalations.len() <= 1);
            }
        }
    }
}

// ========== Resolution bookkeeping ==========

#[test]
fn test_resolve_sets_resolved_at_and_notes() {
    let current = exception(ExceptionStatus::InProgress, EscalationLevel::Level1);
    let request = UpdateRequest {
        desired_status: Some(ExceptionStatus::Resolved),
        resolution_notes: Some("Restarted the pool".to_string()),
        acting_user_id: Some(OPERATOR),
        ..Default::default()
    };
    let outcome = apply_update(&current, &request, NOW);

    assert_eq!(outcome.exception.status, ExceptionStatus::Resolved);
    assert_eq!(outcome.exception.resolved_at, Some(NOW));
    assert_eq!(
        outcome.exception.resolution_notes.as_deref(),
        Some("Restarted the pool")
    );
    assert_eq!(outcome.activity.action, ActivityAction::Resolved);
    assert_eq!(outcome.activity.description, "Exception marked as resolved");
    assert_eq!(outcome.activity.user_id, OPERATOR);
}

#[test]
fn test_repeated_resolve_overwrites_resolved_at() {
    let current = exception(ExceptionStatus::InProgress, EscalationLevel::Level1);
    let request = status(ExceptionStatus::Resolved);

    let first = apply_update(&current, &request, NOW);
    assert_eq!(first.exception.resolved_at, Some(NOW));

    let later = NOW + HOUR_MILLIS;
    let second = apply_update(&first.exception, &request, later);
    assert_eq!(second.exception.resolved_at, Some(later));
}

#[test]
fn test_close_after_resolve_keeps_notes_when_none_given() {
    let mut current = exception(ExceptionStatus::Resolved, EscalationLevel::Level1);
    current.resolved_at = Some(NOW - HOUR_MILLIS);
    current.resolution_notes = Some("Fixed config".to_string());

    let outcome = apply_update(&current, &status(ExceptionStatus::Closed), NOW);
    assert_eq!(outcome.exception.status, ExceptionStatus::Closed);
    assert_eq!(outcome.exception.resolved_at, Some(NOW));
    assert_eq!(
        outcome.exception.resolution_notes.as_deref(),
        Some("Fixed config")
    );
    assert_eq!(outcome.activity.action, ActivityAction::Closed);
    assert_eq!(outcome.activity.description, "Exception closed");
}

#[test]
fn test_reopen_keeps_resolved_at() {
    let mut current = exception(ExceptionStatus::Resolved, EscalationLevel::Level1);
    current.resolved_at = Some(NOW - HOUR_MILLIS);

    let outcome = apply_update(&current, &status(ExceptionStatus::Open), NOW);
    assert_eq!(outcome.exception.status, ExceptionStatus::Open);
    assert_eq!(outcome.exception.resolved_at, Some(NOW - HOUR_MILLIS));
}

#[test]
fn test_notes_ignored_for_non_terminal_status() {
    let current = exception(ExceptionStatus::Open, EscalationLevel::Level1);
    let request = UpdateRequest {
        desired_status: Some(ExceptionStatus::Waiting),
        resolution_notes: Some("premature".to_string()),
        ..Default::default()
    };
    let outcome = apply_update(&current, &request, NOW);
    assert!(outcome.exception.resolution_notes.is_none());
    assert!(outcome.exception.resolved_at.is_none());
}

// ========== Activity synthesis ==========

#[test]
fn test_empty_request_emits_updated() {
    let current = exception(ExceptionStatus::InProgress, EscalationLevel::Level1);
    let outcome = apply_update(&current, &UpdateRequest::default(), NOW);

    assert_eq!(outcome.activity.action, ActivityAction::Updated);
    assert_eq!(outcome.activity.description, "Exception updated");
    // creator is the fallback actor
    assert_eq!(outcome.activity.user_id, CREATOR);
    assert_eq!(outcome.activity.created_at, NOW);
    assert_eq!(outcome.exception.updated_at, NOW);
    assert_eq!(outcome.exception.status, current.status);
}

#[test]
fn test_requested_status_equal_to_current_is_still_status_update() {
    let current = exception(ExceptionStatus::InProgress, EscalationLevel::Level1);
    let outcome = apply_update(&current, &status(ExceptionStatus::InProgress), NOW);
    assert_eq!(outcome.activity.action, ActivityAction::StatusUpdate);
    assert_eq!(outcome.activity.description, "Status changed to IN_PROGRESS");
}

#[test]
fn test_reassignment_alone() {
    let current = exception(ExceptionStatus::InProgress, EscalationLevel::Level1);
    let request = UpdateRequest {
        desired_assignee_id: Some(300),
        acting_user_id: Some(OPERATOR),
        ..Default::default()
    };
    let outcome = apply_update(&current, &request, NOW);

    assert_eq!(outcome.exception.assigned_to_id, Some(300));
    assert_eq!(outcome.exception.status, ExceptionStatus::InProgress);
    assert_eq!(outcome.exception.escalation_level, EscalationLevel::Level1);
    assert_eq!(outcome.activity.action, ActivityAction::Updated);
    assert_eq!(outcome.activity.description, "Reassigned to new user");
}

#[test]
fn test_reassignment_with_status_change() {
    let current = exception(ExceptionStatus::Open, EscalationLevel::Level1);
    let request = UpdateRequest {
        desired_status: Some(ExceptionStatus::InProgress),
        desired_assignee_id: Some(300),
        ..Default::default()
    };
    let outcome = apply_update(&current, &request, NOW);
    assert_eq!(outcome.activity.action, ActivityAction::StatusUpdate);
    assert_eq!(outcome.activity.description, "Reassigned to new user");
}

#[test]
fn test_same_assignee_is_not_a_reassignment() {
    let current = exception(ExceptionStatus::Open, EscalationLevel::Level1);
    let request = UpdateRequest {
        desired_assignee_id: Some(OPERATOR),
        ..Default::default()
    };
    let outcome = apply_update(&current, &request, NOW);
    assert_eq!(outcome.activity.description, "Exception updated");
}

#[test]
fn test_close_outranks_reassignment() {
    let current = exception(ExceptionStatus::InProgress, EscalationLevel::Level1);
    let request = UpdateRequest {
        desired_status: Some(ExceptionStatus::Closed),
        desired_assignee_id: Some(300),
        ..Default::default()
    };
    let outcome = apply_update(&current, &request, NOW);
    assert_eq!(outcome.activity.action, ActivityAction::Closed);
    assert_eq!(outcome.activity.description, "Exception closed");
    assert_eq!(outcome.exception.assigned_to_id, Some(300));
}

#[test]
fn test_action_priority_across_inputs() {
    let assignees = [None, Some(OPERATOR), Some(300)];
    let desired = std::iter::once(None).chain(ExceptionStatus::ALL.into_iter().map(Some));

    for desired_status in desired {
        for desired_assignee_id in assignees {
            for current_status in ExceptionStatus::ALL {
                let current = exception(current_status, EscalationLevel::Level1);
                let request = UpdateRequest {
                    desired_status,
                    desired_assignee_id,
                    ..Default::default()
                };
                let outcome = apply_update(&current, &request, NOW);
                let final_status = outcome.exception.status;

                let expected = match desired_status {
                    Some(ExceptionStatus::Closed) => ActivityAction::Closed,
                    Some(ExceptionStatus::Resolved) => ActivityAction::Resolved,
                    _ if desired_status.is_some() || final_status != current_status => {
                        ActivityAction::StatusUpdate
                    }
                    _ => ActivityAction::Updated,
                };
                assert_eq!(
                    outcome.activity.action, expected,
                    "desired {desired_status:?} assignee {desired_assignee_id:?} from {current_status:?}"
                );
            }
        }
    }
}

#[test]
fn test_reassigning_a_finished_exception_keeps_resolution() {
    for finished in [ExceptionStatus::Resolved, ExceptionStatus::Closed] {
        let mut current = exception(finished, EscalationLevel::Level2);
        current.resolved_at = Some(NOW - 5 * HOUR_MILLIS);
        current.resolution_notes = Some("Restarted the gateway".to_string());
        let request = UpdateRequest {
            desired_assignee_id: Some(300),
            resolution_notes: Some("ignored".to_string()),
            ..Default::default()
        };
        let outcome = apply_update(&current, &request, NOW);

        assert_eq!(outcome.exception.status, finished);
        assert_eq!(outcome.exception.assigned_to_id, Some(300));
        assert_eq!(outcome.exception.resolved_at, current.resolved_at);
        assert_eq!(outcome.exception.resolution_notes, current.resolution_notes);
        assert_eq!(outcome.activity.action, ActivityAction::Updated, "{finished:?}");
        assert_eq!(outcome.activity.description, "Reassigned to new user");
    }
}

#[test]
fn test_refreshing_a_finished_exception_keeps_resolution() {
    for finished in [ExceptionStatus::Resolved, ExceptionStatus::Closed] {
        let mut current = breached(exception(finished, EscalationLevel::Level1));
        current.resolved_at = Some(NOW - 5 * HOUR_MILLIS);
        let outcome = apply_update(&current, &UpdateRequest::default(), NOW);

        assert_eq!(outcome.exception.status, finished);
        assert_eq!(outcome.exception.resolved_at, current.resolved_at);
        assert!(outcome.escalations.is_empty());
        assert_eq!(outcome.activity.action, ActivityAction::Updated, "{finished:?}");
        assert_eq!(outcome.activity.description, "Exception updated");
        assert_eq!(outcome.exception.updated_at, NOW);
    }
}

// ========== Creation ==========

#[test]
fn test_critical_starts_at_level_2() {
    let (exception, activity) = new_exception(7, creation_input(Severity::Critical), NOW).unwrap();

    assert_eq!(exception.id, 7);
    assert_eq!(exception.status, ExceptionStatus::Open);
    assert_eq!(exception.escalation_level, EscalationLevel::Level2);
    assert_eq!(exception.impact_level, DEFAULT_IMPACT_LEVEL);
    assert_eq!(exception.sla_deadline, NOW + DEFAULT_SLA_HOURS * HOUR_MILLIS);
    assert_eq!(exception.created_at, NOW);
    assert!(exception.resolved_at.is_none());

    assert_eq!(activity.action, ActivityAction::Created);
    assert_eq!(
        activity.description,
        "Exception created: Database connection pool exhausted"
    );
    assert_eq!(activity.user_id, CREATOR);
    assert_eq!(activity.metadata["severity"], "CRITICAL");
    assert_eq!(activity.metadata["category"], "Infrastructure");
}

#[test]
fn test_non_critical_starts_at_level_1_with_given_deadline() {
    let mut input = creation_input(Severity::Medium);
    input.sla_deadline = Some(NOW + 2 * HOUR_MILLIS);
    input.impact_level = Some(5);
    input.assigned_to_id = Some(OPERATOR);

    let (exception, _) = new_exception(8, input, NOW).unwrap();
    assert_eq!(exception.escalation_level, EscalationLevel::Level1);
    assert_eq!(exception.sla_deadline, NOW + 2 * HOUR_MILLIS);
    assert_eq!(exception.impact_level, 5);
    assert_eq!(exception.assigned_to_id, Some(OPERATOR));
}

#[test]
fn test_creation_rejects_bad_input() {
    let mut input = creation_input(Severity::Low);
    input.impact_level = Some(6);
    let err = new_exception(9, input, NOW).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidImpactLevel);

    let mut input = creation_input(Severity::Low);
    input.title = "   ".to_string();
    let err = new_exception(9, input, NOW).unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);
}

#[test]
fn test_payload_parsing() {
    let payload = shared::models::ExceptionCreate {
        title: "Label printer offline".to_string(),
        description: "Warehouse B".to_string(),
        category: "Hardware".to_string(),
        severity: "LOW".to_string(),
        impact_level: Some(2),
        assigned_to_id: None,
        sla_deadline: None,
        created_by_id: None,
    };
    let input = NewException::from_payload(payload.clone(), OPERATOR).unwrap();
    assert_eq!(input.severity, Severity::Low);
    assert_eq!(input.created_by_id, OPERATOR);

    let bad = shared::models::ExceptionCreate {
        severity: "SEVERE".to_string(),
        ..payload
    };
    let err = NewException::from_payload(bad, OPERATOR).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidSeverity);
}
