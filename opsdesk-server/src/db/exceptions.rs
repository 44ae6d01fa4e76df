//! Exception queries and the transactional workflow writes

use std::collections::HashMap;

use shared::models::{
    ActivityLog, Exception, ExceptionDetail, ExceptionListItem, ExceptionStatus, Severity,
    SlaStatus, UserSummary,
};
use shared::util::snowflake_id;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{activities, escalations, users};
use crate::BoxError;
use crate::lifecycle::LifecycleOutcome;

const EXCEPTION_COLUMNS: &str = "id, title, description, category, severity, impact_level, \
     status, escalation_level, sla_deadline, resolved_at, resolution_notes, assigned_to_id, \
     created_by_id, created_at, updated_at";

/// List predicate; `None` fields do not filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionFilter {
    pub status: Option<ExceptionStatus>,
    pub severity: Option<Severity>,
    pub assigned_to: Option<i64>,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Exception>, BoxError> {
    let row = sqlx::query_as::<_, Exception>(&format!(
        "SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Matching exceptions, newest first
pub async fn list(pool: &SqlitePool, filter: &ExceptionFilter) -> Result<Vec<Exception>, BoxError> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE 1 = 1"
    ));
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(severity) = filter.severity {
        qb.push(" AND severity = ").push_bind(severity);
    }
    if let Some(assignee) = filter.assigned_to {
        qb.push(" AND assigned_to_id = ").push_bind(assignee);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    let rows = qb.build_query_as::<Exception>().fetch_all(pool).await?;
    Ok(rows)
}

/// Every exception, newest first (KPI aggregation input)
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Exception>, BoxError> {
    list(pool, &ExceptionFilter::default()).await
}

pub(crate) async fn insert(conn: &mut SqliteConnection, e: &Exception) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO exceptions (id, title, description, category, severity, impact_level, status, \
         escalation_level, sla_deadline, resolved_at, resolution_notes, assigned_to_id, \
         created_by_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(e.id)
    .bind(&e.title)
    .bind(&e.description)
    .bind(&e.category)
    .bind(e.severity)
    .bind(e.impact_level)
    .bind(e.status)
    .bind(e.escalation_level)
    .bind(e.sla_deadline)
    .bind(e.resolved_at)
    .bind(&e.resolution_notes)
    .bind(e.assigned_to_id)
    .bind(e.created_by_id)
    .bind(e.created_at)
    .bind(e.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Write back the fields the lifecycle engine may change
async fn update_state(conn: &mut SqliteConnection, e: &Exception) -> Result<u64, BoxError> {
    let result = sqlx::query(
        "UPDATE exceptions SET status = ?, escalation_level = ?, assigned_to_id = ?, \
         resolved_at = ?, resolution_notes = ?, updated_at = ? WHERE id = ?",
    )
    .bind(e.status)
    .bind(e.escalation_level)
    .bind(e.assigned_to_id)
    .bind(e.resolved_at)
    .bind(&e.resolution_notes)
    .bind(e.updated_at)
    .bind(e.id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Insert a new exception with its CREATED activity in one transaction
pub async fn commit_create(
    pool: &SqlitePool,
    exception: &Exception,
    activity: &ActivityLog,
) -> Result<(), BoxError> {
    let mut tx = pool.begin().await?;
    insert(&mut *tx, exception).await?;
    activities::insert(&mut *tx, activity).await?;
    tx.commit().await?;
    Ok(())
}

/// Persist one engine outcome atomically: exception row, new escalations
/// and the activity. Returns false (and writes nothing) when the exception
/// no longer exists.
pub async fn commit_update(pool: &SqlitePool, outcome: &LifecycleOutcome) -> Result<bool, BoxError> {
    let exception_id = outcome.exception.id;
    let mut tx = pool.begin().await?;

    if update_state(&mut *tx, &outcome.exception).await? == 0 {
        tx.rollback().await?;
        return Ok(false);
    }
    for escalation in &outcome.escalations {
        let record = escalation.clone().into_record(snowflake_id(), exception_id);
        escalations::insert(&mut *tx, &record).await?;
    }
    let activity = outcome
        .activity
        .clone()
        .into_record(snowflake_id(), exception_id);
    activities::insert(&mut *tx, &activity).await?;

    tx.commit().await?;
    Ok(true)
}

/// Delete an exception; escalations and activities cascade
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM exceptions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Exception with relations and SLA state at `now`
pub async fn load_detail(
    pool: &SqlitePool,
    id: i64,
    now: i64,
) -> Result<Option<ExceptionDetail>, BoxError> {
    let Some(exception) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let assigned_to = match exception.assigned_to_id {
        Some(user_id) => users::find_by_id(pool, user_id).await?.map(|u| u.summary()),
        None => None,
    };
    let created_by = users::find_by_id(pool, exception.created_by_id)
        .await?
        .map(|u| u.summary());
    let escalations = escalations::list_for_exception(pool, id).await?;
    let activities = activities::list_for_exception(pool, id).await?;
    let sla = SlaStatus::evaluate(exception.sla_deadline, now);

    Ok(Some(ExceptionDetail {
        exception,
        assigned_to,
        created_by,
        escalations,
        activities,
        sla,
    }))
}

/// List rows with relations, newest first
pub async fn list_items(
    pool: &SqlitePool,
    filter: &ExceptionFilter,
) -> Result<Vec<ExceptionListItem>, BoxError> {
    let rows = list(pool, filter).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|e| e.id).collect();
    let people: HashMap<i64, UserSummary> = users::list_summaries(pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut escalations_by_exception: HashMap<i64, Vec<_>> = HashMap::new();
    for escalation in escalations::list_for_exceptions(pool, &ids).await? {
        escalations_by_exception
            .entry(escalation.exception_id)
            .or_default()
            .push(escalation);
    }
    let counts: HashMap<i64, i64> = activities::count_by_exception(pool, &ids)
        .await?
        .into_iter()
        .collect();

    Ok(rows
        .into_iter()
        .map(|exception| ExceptionListItem {
            assigned_to: exception
                .assigned_to_id
                .and_then(|id| people.get(&id).cloned()),
            created_by: people.get(&exception.created_by_id).cloned(),
            escalations: escalations_by_exception
                .remove(&exception.id)
                .unwrap_or_default(),
            activity_count: counts.get(&exception.id).copied().unwrap_or(0),
            exception,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{exception, insert_user, test_pool};
    use crate::lifecycle::{UpdateRequest, apply_update};
    use shared::models::{ActivityAction, EscalationLevel, UserRole};
    use shared::util::HOUR_MILLIS;

    const NOW: i64 = 1_760_000_000_000;

    async fn create(pool: &SqlitePool, e: &Exception) {
        let activity = ActivityLog {
            id: snowflake_id(),
            exception_id: e.id,
            user_id: e.created_by_id,
            action: ActivityAction::Created.as_str().to_string(),
            description: format!("Exception created: {}", e.title),
            metadata: serde_json::json!({ "severity": e.severity }),
            created_at: e.created_at,
        };
        commit_create(pool, e, &activity).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_load_detail() {
        let pool = test_pool().await;
        insert_user(&pool, 1, "Sarah", UserRole::Management).await;
        insert_user(&pool, 2, "Alex", UserRole::Operational).await;

        let mut e = exception(10, 1, Severity::High, NOW);
        e.assigned_to_id = Some(2);
        create(&pool, &e).await;

        let detail = load_detail(&pool, 10, NOW).await.unwrap().unwrap();
        assert_eq!(detail.exception, e);
        assert_eq!(detail.assigned_to.as_ref().map(|u| u.name.as_str()), Some("Alex"));
        assert_eq!(detail.created_by.as_ref().map(|u| u.id), Some(1));
        assert!(detail.escalations.is_empty());
        assert_eq!(detail.activities.len(), 1);
        assert_eq!(detail.activities[0].activity.action, "CREATED");
        assert_eq!(detail.activities[0].activity.metadata["severity"], "HIGH");
        assert_eq!(
            detail.activities[0].user.as_ref().map(|u| u.name.as_str()),
            Some("Sarah")
        );

        assert!(load_detail(&pool, 99, NOW).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_update_writes_all_three() {
        let pool = test_pool().await;
        insert_user(&pool, 1, "Sarah", UserRole::Management).await;
        let mut e = exception(10, 1, Severity::High, NOW - 2 * HOUR_MILLIS);
        e.sla_deadline = NOW - HOUR_MILLIS;
        create(&pool, &e).await;

        let outcome = apply_update(&e, &UpdateRequest::default(), NOW);
        assert!(commit_update(&pool, &outcome).await.unwrap());

        let detail = load_detail(&pool, 10, NOW).await.unwrap().unwrap();
        assert_eq!(detail.exception.status, ExceptionStatus::Escalated);
        assert_eq!(detail.exception.escalation_level, EscalationLevel::Level2);
        assert_eq!(detail.exception.updated_at, NOW);
        assert_eq!(detail.escalations.len(), 1);
        assert_eq!(detail.escalations[0].level, EscalationLevel::Level2);
        // newest first
        assert_eq!(detail.activities.len(), 2);
        assert_eq!(detail.activities[0].activity.action, "STATUS_UPDATE");
        assert_eq!(detail.activities[0].activity.metadata["newStatus"], "ESCALATED");
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() {
        let pool = test_pool().await;
        insert_user(&pool, 1, "Sarah", UserRole::Management).await;
        let mut e = exception(10, 1, Severity::Low, NOW - 2 * HOUR_MILLIS);
        e.sla_deadline = NOW - HOUR_MILLIS;
        create(&pool, &e).await;

        // actor does not exist: the activity insert violates its foreign key
        let request = UpdateRequest {
            acting_user_id: Some(404),
            ..Default::default()
        };
        let outcome = apply_update(&e, &request, NOW);
        assert!(outcome.escalated());
        assert!(commit_update(&pool, &outcome).await.is_err());

        let stored = find_by_id(&pool, 10).await.unwrap().unwrap();
        assert_eq!(stored, e);
        assert!(escalations::list_for_exception(&pool, 10).await.unwrap().is_empty());
        assert_eq!(activities::list_for_exception(&pool, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_update_on_missing_exception() {
        let pool = test_pool().await;
        insert_user(&pool, 1, "Sarah", UserRole::Management).await;
        let e = exception(10, 1, Severity::Low, NOW);
        let outcome = apply_update(&e, &UpdateRequest::default(), NOW);
        assert!(!commit_update(&pool, &outcome).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_and_relations() {
        let pool = test_pool().await;
        insert_user(&pool, 1, "Sarah", UserRole::Management).await;
        insert_user(&pool, 2, "Alex", UserRole::Operational).await;

        let mut a = exception(10, 1, Severity::Critical, NOW - 3 * HOUR_MILLIS);
        a.assigned_to_id = Some(2);
        let b = exception(11, 1, Severity::Low, NOW - 2 * HOUR_MILLIS);
        let mut c = exception(12, 1, Severity::Low, NOW - HOUR_MILLIS);
        c.status = ExceptionStatus::Resolved;
        for e in [&a, &b, &c] {
            create(&pool, e).await;
        }

        let all = list_items(&pool, &ExceptionFilter::default()).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|i| i.exception.id).collect();
        assert_eq!(ids, vec![12, 11, 10]);
        assert!(all.iter().all(|i| i.activity_count == 1));
        assert_eq!(all[2].assigned_to.as_ref().map(|u| u.id), Some(2));
        assert!(all[1].assigned_to.is_none());

        let filter = ExceptionFilter {
            severity: Some(Severity::Low),
            status: Some(ExceptionStatus::Open),
            ..Default::default()
        };
        let rows = list(&pool, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 11);

        let mine = list(
            &pool,
            &ExceptionFilter {
                assigned_to: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, 10);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let pool = test_pool().await;
        insert_user(&pool, 1, "Sarah", UserRole::Management).await;
        let mut e = exception(10, 1, Severity::Low, NOW - 2 * HOUR_MILLIS);
        e.sla_deadline = NOW - HOUR_MILLIS;
        create(&pool, &e).await;
        let outcome = apply_update(&e, &UpdateRequest::default(), NOW);
        commit_update(&pool, &outcome).await.unwrap();

        assert!(delete(&pool, 10).await.unwrap());
        assert!(!delete(&pool, 10).await.unwrap());

        let (escalations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM escalations")
            .fetch_one(&pool)
            .await
            .unwrap();
        let (activities,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(escalations, 0);
        assert_eq!(activities, 0);
    }
}
