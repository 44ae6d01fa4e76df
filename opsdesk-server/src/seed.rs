//! Demo data
//!
//! Five accounts, ten exceptions spread across every status, a few
//! escalations and activities, and three days of KPI history. Timestamps are
//! relative to `now` so SLA states look the same whenever the seed runs.

use serde_json::json;
use shared::models::{
    ActivityLog, Escalation, EscalationLevel, Exception, ExceptionStatus, KpiMetric, MetricType,
    Severity, User, UserRole,
};
use shared::util::{HOUR_MILLIS, snowflake_id};
use sqlx::SqlitePool;

use crate::BoxError;
use crate::db::{activities, escalations, exceptions, kpi_metrics, users};
use crate::util::hash_password;

/// Password of every demo account
pub const DEMO_PASSWORD: &str = "password123";

const AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

struct DemoUser {
    email: &'static str,
    name: &'static str,
    role: UserRole,
    avatar_seed: &'static str,
}

const USERS: [DemoUser; 5] = [
    DemoUser {
        email: "management@example.com",
        name: "John Manager",
        role: UserRole::Management,
        avatar_seed: "John",
    },
    DemoUser {
        email: "supervisor@example.com",
        name: "Sarah Supervisor",
        role: UserRole::Supervisor,
        avatar_seed: "Sarah",
    },
    DemoUser {
        email: "op1@example.com",
        name: "Mike Operator",
        role: UserRole::Operational,
        avatar_seed: "Mike",
    },
    DemoUser {
        email: "op2@example.com",
        name: "Lisa Operator",
        role: UserRole::Operational,
        avatar_seed: "Lisa",
    },
    DemoUser {
        email: "head@example.com",
        name: "David DepartmentHead",
        role: UserRole::Management,
        avatar_seed: "David",
    },
];

const MANAGER: usize = 0;
const SUPERVISOR: usize = 1;
const OPERATOR_1: usize = 2;
const OPERATOR_2: usize = 3;
const HEAD: usize = 4;

struct DemoException {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    severity: Severity,
    impact_level: i32,
    status: ExceptionStatus,
    escalation_level: EscalationLevel,
    /// Deadline relative to now
    deadline_hours: i64,
    /// Resolution time relative to now
    resolved_hours: Option<i64>,
    resolution_notes: Option<&'static str>,
    assignee: usize,
    creator: usize,
}

const EXCEPTIONS: [DemoException; 10] = [
    DemoException {
        title: "Database Connection Timeout",
        description: "Primary database experiencing intermittent connection timeouts affecting read operations.",
        category: "Infrastructure",
        severity: Severity::Critical,
        impact_level: 5,
        status: ExceptionStatus::Open,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: 2,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_1,
        creator: MANAGER,
    },
    DemoException {
        title: "Payment Gateway Integration Issue",
        description: "Customers reporting failed payment transactions with error code 503.",
        category: "Payment",
        severity: Severity::High,
        impact_level: 4,
        status: ExceptionStatus::InProgress,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: 6,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_2,
        creator: SUPERVISOR,
    },
    DemoException {
        title: "API Response Time Degradation",
        description: "API endpoints showing increased response times over 2 seconds average.",
        category: "Performance",
        severity: Severity::Medium,
        impact_level: 3,
        status: ExceptionStatus::Escalated,
        escalation_level: EscalationLevel::Level2,
        deadline_hours: -24,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_1,
        creator: MANAGER,
    },
    DemoException {
        title: "Email Notification Service Down",
        description: "Email notifications not being sent to users for password resets.",
        category: "Communication",
        severity: Severity::High,
        impact_level: 4,
        status: ExceptionStatus::Waiting,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: 12,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_2,
        creator: SUPERVISOR,
    },
    DemoException {
        title: "User Session Timeout Errors",
        description: "Users being logged out unexpectedly due to session validation failures.",
        category: "Authentication",
        severity: Severity::Medium,
        impact_level: 3,
        status: ExceptionStatus::InProgress,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: 8,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_1,
        creator: MANAGER,
    },
    DemoException {
        title: "Report Generation Failure",
        description: "Scheduled monthly reports failing to generate due to data processing errors.",
        category: "Reporting",
        severity: Severity::Low,
        impact_level: 2,
        status: ExceptionStatus::Resolved,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: -48,
        resolved_hours: Some(-24),
        resolution_notes: Some("Fixed data processing pipeline. Reports now generating successfully."),
        assignee: OPERATOR_2,
        creator: SUPERVISOR,
    },
    DemoException {
        title: "Mobile App Sync Issues",
        description: "Mobile app users experiencing sync delays with backend services.",
        category: "Mobile",
        severity: Severity::Medium,
        impact_level: 3,
        status: ExceptionStatus::Open,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: 10,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_1,
        creator: MANAGER,
    },
    DemoException {
        title: "Data Backup Process Alert",
        description: "Last night's backup process completed with warnings.",
        category: "Infrastructure",
        severity: Severity::Low,
        impact_level: 2,
        status: ExceptionStatus::Closed,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: -72,
        resolved_hours: Some(-48),
        resolution_notes: Some("Investigated backup warnings. No data loss. Process optimized."),
        assignee: OPERATOR_2,
        creator: SUPERVISOR,
    },
    DemoException {
        title: "Search Functionality Broken",
        description: "Full-text search returning no results for valid queries.",
        category: "Feature",
        severity: Severity::High,
        impact_level: 4,
        status: ExceptionStatus::Escalated,
        escalation_level: EscalationLevel::Level3,
        deadline_hours: -24,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_1,
        creator: MANAGER,
    },
    DemoException {
        title: "Third-party API Rate Limiting",
        description: "External vendor API returning 429 errors due to rate limit exceeded.",
        category: "Integration",
        severity: Severity::Medium,
        impact_level: 3,
        status: ExceptionStatus::InProgress,
        escalation_level: EscalationLevel::Level1,
        deadline_hours: 4,
        resolved_hours: None,
        resolution_notes: None,
        assignee: OPERATOR_2,
        creator: SUPERVISOR,
    },
];

/// Insert the demo data set unless users already exist.
///
/// Returns whether anything was written. Accounts, exceptions and their
/// history share one transaction; the KPI rows follow in a second one.
pub async fn seed_demo_data(pool: &SqlitePool, now: i64) -> Result<bool, BoxError> {
    if users::count(pool).await? > 0 {
        tracing::debug!("Users present, skipping demo seed");
        return Ok(false);
    }

    // one hash for all accounts keeps startup fast; they share a password anyway
    let hashed_password = hash_password(DEMO_PASSWORD).map_err(|e| e.to_string())?;
    let hours = |h: i64| now + h * HOUR_MILLIS;

    let people: Vec<User> = USERS
        .iter()
        .map(|u| User {
            id: snowflake_id(),
            email: u.email.to_string(),
            name: u.name.to_string(),
            role: u.role,
            avatar: Some(format!("{AVATAR_BASE}{}", u.avatar_seed)),
            hashed_password: hashed_password.clone(),
            created_at: hours(-96),
        })
        .collect();

    let rows: Vec<Exception> = EXCEPTIONS
        .iter()
        .map(|d| {
            let sla_deadline = hours(d.deadline_hours);
            let created_at = sla_deadline - 24 * HOUR_MILLIS;
            let resolved_at = d.resolved_hours.map(hours);
            Exception {
                id: snowflake_id(),
                title: d.title.to_string(),
                description: d.description.to_string(),
                category: d.category.to_string(),
                severity: d.severity,
                impact_level: d.impact_level,
                status: d.status,
                escalation_level: d.escalation_level,
                sla_deadline,
                resolved_at,
                resolution_notes: d.resolution_notes.map(str::to_string),
                assigned_to_id: Some(people[d.assignee].id),
                created_by_id: people[d.creator].id,
                created_at,
                updated_at: resolved_at.unwrap_or(created_at),
            }
        })
        .collect();

    let escalation = |exception: usize, level, reason: &str, to: usize, notes: &str, at| Escalation {
        id: snowflake_id(),
        exception_id: rows[exception].id,
        level,
        reason: reason.to_string(),
        escalated_to: people[to].name.clone(),
        notes: Some(notes.to_string()),
        escalated_at: at,
    };
    let escalation_rows = [
        escalation(
            2,
            EscalationLevel::Level2,
            "SLA deadline exceeded without resolution",
            SUPERVISOR,
            "Escalated to supervisor level due to SLA breach",
            hours(-23),
        ),
        escalation(
            8,
            EscalationLevel::Level2,
            "Critical functionality down, no progress after 24h",
            SUPERVISOR,
            "Escalated due to critical search functionality being unavailable",
            hours(-23),
        ),
        escalation(
            8,
            EscalationLevel::Level3,
            "Critical issue unresolved after supervisor escalation",
            HEAD,
            "Department head intervention required",
            hours(-1),
        ),
    ];

    let activity = |exception: usize, user: usize, action: &str, description: &str, metadata, at| {
        ActivityLog {
            id: snowflake_id(),
            exception_id: rows[exception].id,
            user_id: people[user].id,
            action: action.to_string(),
            description: description.to_string(),
            metadata,
            created_at: at,
        }
    };
    let activity_rows = [
        activity(
            0,
            MANAGER,
            "CREATED",
            "Exception created and assigned to Mike Operator",
            json!({ "severity": "CRITICAL" }),
            rows[0].created_at,
        ),
        activity(
            1,
            SUPERVISOR,
            "CREATED",
            "Payment gateway issue logged",
            json!({ "category": "Payment" }),
            rows[1].created_at,
        ),
        activity(
            2,
            OPERATOR_1,
            "STATUS_UPDATE",
            "Status changed to IN_PROGRESS",
            json!({ "oldStatus": "OPEN", "newStatus": "IN_PROGRESS" }),
            rows[2].created_at + HOUR_MILLIS,
        ),
        activity(
            2,
            SUPERVISOR,
            "ESCALATED",
            "Escalated to Level 2 due to SLA breach",
            json!({ "level": "LEVEL_2" }),
            hours(-23),
        ),
        activity(
            5,
            OPERATOR_2,
            "RESOLVED",
            "Report generation issue resolved",
            json!({ "resolutionTime": "4 hours" }),
            hours(-24),
        ),
        activity(
            5,
            SUPERVISOR,
            "CLOSED",
            "Issue verified and closed",
            json!({}),
            hours(-23),
        ),
    ];

    let metric = |metric_type, metric_value, recorded_at| KpiMetric {
        id: snowflake_id(),
        metric_type,
        metric_value,
        recorded_at,
    };
    let metrics = [
        metric(MetricType::OpenExceptions, 4.0, now),
        metric(MetricType::SlaCompliance, 85.5, now),
        metric(MetricType::EscalationRate, 15.2, now),
        metric(MetricType::AvgResolutionTime, 6.8, now),
        metric(MetricType::OpenExceptions, 5.0, hours(-24)),
        metric(MetricType::OpenExceptions, 6.0, hours(-48)),
        metric(MetricType::SlaCompliance, 88.0, hours(-24)),
        metric(MetricType::SlaCompliance, 82.5, hours(-48)),
    ];

    let mut tx = pool.begin().await?;
    for user in &people {
        users::insert(&mut *tx, user).await?;
    }
    for exception in &rows {
        exceptions::insert(&mut *tx, exception).await?;
    }
    for escalation in &escalation_rows {
        escalations::insert(&mut *tx, escalation).await?;
    }
    for activity in &activity_rows {
        activities::insert(&mut *tx, activity).await?;
    }
    tx.commit().await?;
    kpi_metrics::insert_snapshot(pool, &metrics).await?;

    tracing::info!(
        users = people.len(),
        exceptions = rows.len(),
        "Demo data seeded (password: {DEMO_PASSWORD})"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::util::verify_password;

    const NOW: i64 = 1_760_011_200_000;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = test_pool().await;
        assert!(seed_demo_data(&pool, NOW).await.unwrap());
        assert!(!seed_demo_data(&pool, NOW).await.unwrap());

        assert_eq!(users::count(&pool).await.unwrap(), 5);
        assert_eq!(exceptions::list_all(&pool).await.unwrap().len(), 10);
        assert_eq!(kpi_metrics::list_since(&pool, 0).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_seeded_accounts_can_log_in() {
        let pool = test_pool().await;
        seed_demo_data(&pool, NOW).await.unwrap();

        let manager = users::find_by_email(&pool, "management@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manager.role, UserRole::Management);
        assert!(verify_password(DEMO_PASSWORD, &manager.hashed_password));
    }

    #[tokio::test]
    async fn test_seeded_history() {
        let pool = test_pool().await;
        seed_demo_data(&pool, NOW).await.unwrap();

        let search = exceptions::list_all(&pool)
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.title == "Search Functionality Broken")
            .unwrap();
        let chain = escalations::list_for_exception(&pool, search.id)
            .await
            .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].level, EscalationLevel::Level3);
        assert_eq!(activities::recent(&pool, 10).await.unwrap().len(), 6);
    }
}
