//! KPI report, snapshots and role dashboards

use shared::error::{AppError, ErrorCode};
use shared::models::{DashboardResponse, DashboardView, KpiMetric, KpiReport, MetricType};
use sqlx::SqlitePool;

use crate::auth::{Capability, CurrentUser, ListScope};
use crate::dashboard;
use crate::db::exceptions::ExceptionFilter;
use crate::db::{activities, exceptions, kpi_metrics, users};
use crate::error::ServiceResult;
use crate::kpi;

/// Default and maximum rows for a metric history request
pub const HISTORY_DEFAULT_LIMIT: i64 = 30;
pub const HISTORY_MAX_LIMIT: i64 = 365;

async fn build_report(pool: &SqlitePool, now: i64) -> ServiceResult<KpiReport> {
    let all = exceptions::list_all(pool).await?;
    let people = users::list_summaries(pool).await?;
    let history = kpi_metrics::list_since(pool, kpi::trend_window_start(now)).await?;
    let recent = activities::recent(pool, kpi::RECENT_ACTIVITY_LIMIT).await?;
    Ok(kpi::compute_report(&all, &people, &history, recent, now))
}

pub async fn kpi_report(pool: &SqlitePool, caller: &CurrentUser, now: i64) -> ServiceResult<KpiReport> {
    caller.require(Capability::ViewKpis)?;
    build_report(pool, now).await
}

/// Persist the current headline figures as history rows
pub async fn record_snapshot(
    pool: &SqlitePool,
    caller: &CurrentUser,
    now: i64,
) -> ServiceResult<Vec<KpiMetric>> {
    caller.require(Capability::RecordKpiSnapshots)?;
    let all = exceptions::list_all(pool).await?;
    let metrics = kpi::snapshot_metrics(&kpi::summarize(&all, now), now);
    kpi_metrics::insert_snapshot(pool, &metrics).await?;
    tracing::info!(recorded_at = now, rows = metrics.len(), "KPI snapshot recorded");
    Ok(metrics)
}

/// Stored values of one metric, oldest first
pub async fn metric_history(
    pool: &SqlitePool,
    caller: &CurrentUser,
    metric_type: MetricType,
    limit: Option<i64>,
) -> ServiceResult<Vec<KpiMetric>> {
    caller.require(Capability::ViewKpis)?;
    let limit = limit.unwrap_or(HISTORY_DEFAULT_LIMIT);
    if !(1..=HISTORY_MAX_LIMIT).contains(&limit) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("limit must be between 1 and {HISTORY_MAX_LIMIT}"),
        )
        .into());
    }
    Ok(kpi_metrics::history(pool, metric_type, limit).await?)
}

/// The caller's role view
pub async fn dashboard(
    pool: &SqlitePool,
    caller: &CurrentUser,
    now: i64,
) -> ServiceResult<DashboardResponse> {
    let user = users::find_by_id(pool, caller.id)
        .await?
        .ok_or_else(|| AppError::user_not_found(caller.id))?
        .summary();

    let view = if caller.has(Capability::RecordKpiSnapshots) {
        DashboardView::Management(build_report(pool, now).await?)
    } else if caller.has(Capability::ViewKpis) {
        let all = exceptions::list_all(pool).await?;
        let people = users::list_summaries(pool).await?;
        DashboardView::Supervisor(dashboard::supervisor_view(&all, &people, now))
    } else {
        let assigned = match ListScope::for_user(caller) {
            ListScope::AssignedTo(id) => {
                let filter = ExceptionFilter {
                    assigned_to: Some(id),
                    ..Default::default()
                };
                exceptions::list(pool, &filter).await?
            }
            ListScope::All => exceptions::list_all(pool).await?,
            ListScope::Nothing => Vec::new(),
        };
        DashboardView::Operational(dashboard::operational_view(&assigned, now))
    };

    Ok(DashboardResponse { user, view })
}
