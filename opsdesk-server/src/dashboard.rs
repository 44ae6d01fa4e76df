//! Role dashboards
//!
//! Management gets the full KPI report (see [`crate::kpi`]); the two views
//! below are the narrower supervisor and operational summaries.

use shared::models::{
    EscalationLevel, Exception, ExceptionBrief, ExceptionStatus, OperationalDashboard, Severity,
    SupervisorDashboard, UserSummary,
};
use shared::util::utc_day;

use crate::kpi;

/// Escalations shown on the supervisor dashboard
pub const RECENT_ESCALATIONS_LIMIT: usize = 5;

fn is_escalated(e: &Exception) -> bool {
    e.escalation_level != EscalationLevel::Level1
}

/// Escalation overview over every exception
pub fn supervisor_view(
    exceptions: &[Exception],
    users: &[UserSummary],
    now: i64,
) -> SupervisorDashboard {
    let mut escalated: Vec<&Exception> = exceptions.iter().filter(|e| is_escalated(e)).collect();
    escalated.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    SupervisorDashboard {
        escalated_items: escalated.len() as i64,
        sla_breaches: kpi::sla_breaches(exceptions, now).len() as i64,
        team_workload: kpi::team_workload(exceptions, users),
        recent_escalations: escalated
            .into_iter()
            .take(RECENT_ESCALATIONS_LIMIT)
            .map(ExceptionBrief::from)
            .collect(),
    }
}

/// Personal counters over the caller's assigned exceptions
pub fn operational_view(assigned: &[Exception], now: i64) -> OperationalDashboard {
    let today = utc_day(now);
    let mut view = OperationalDashboard {
        my_assignments: assigned.len() as i64,
        critical: 0,
        due_today: 0,
        resolved: 0,
        assignments: assigned.iter().map(ExceptionBrief::from).collect(),
    };
    for e in assigned {
        if e.severity == Severity::Critical {
            view.critical += 1;
        }
        if utc_day(e.sla_deadline) == today {
            view.due_today += 1;
        }
        if e.status == ExceptionStatus::Resolved {
            view.resolved += 1;
        }
    }
    view
}
