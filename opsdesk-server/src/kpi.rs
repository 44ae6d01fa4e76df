//! KPI aggregation
//!
//! Pure functions over a snapshot of all exceptions. The report is what the
//! management dashboard renders; [`snapshot_metrics`] turns its headline
//! figures into history rows for later trend lines.

use std::collections::{BTreeMap, HashMap};

use chrono::DateTime;
use shared::models::{
    EscalationLevel, Exception, ExceptionBrief, ExceptionStatus, KpiMetric, KpiReport,
    KpiSummary, MetricType, RecentActivity, Severity, SeverityBreakdown, SlaBreach, TrendPoint,
    UserSummary, WorkloadEntry,
};
use shared::util::{HOUR_MILLIS, snowflake_id, utc_day};

/// Days of stored history shown before the live point
pub const TREND_HISTORY_DAYS: i64 = 3;
/// Rows in the recent activity feed
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;

const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Round to one decimal
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn is_open(e: &Exception) -> bool {
    !e.status.is_terminal()
}

/// Missed its deadline: resolved late, or still open past it
pub fn is_breached(e: &Exception, now: i64) -> bool {
    if e.status.is_terminal() {
        e.resolved_at.is_some_and(|at| at > e.sla_deadline)
    } else {
        now > e.sla_deadline
    }
}

/// Headline figures
pub fn summarize(exceptions: &[Exception], now: i64) -> KpiSummary {
    let open = exceptions.iter().filter(|e| is_open(e)).count();
    let total_active = exceptions
        .iter()
        .filter(|e| e.status != ExceptionStatus::Closed)
        .count();
    let breached = exceptions.iter().filter(|e| is_breached(e, now)).count();

    let sla_compliance = if total_active > 0 {
        // breaches are counted over closed rows too, so keep the ratio in range
        let within = total_active.saturating_sub(breached);
        within as f64 / total_active as f64 * 100.0
    } else {
        100.0
    };

    let escalated = exceptions
        .iter()
        .filter(|e| e.escalation_level != EscalationLevel::Level1)
        .count();
    let escalation_rate = if exceptions.is_empty() {
        0.0
    } else {
        escalated as f64 / exceptions.len() as f64 * 100.0
    };

    let resolution_times: Vec<i64> = exceptions
        .iter()
        .filter_map(|e| e.resolved_at.map(|at| at - e.created_at))
        .collect();
    let avg_resolution_time_hours = if resolution_times.is_empty() {
        0.0
    } else {
        let total: i64 = resolution_times.iter().sum();
        total as f64 / resolution_times.len() as f64 / HOUR_MILLIS as f64
    };

    KpiSummary {
        open_exceptions: open as f64,
        sla_compliance: round1(sla_compliance),
        escalation_rate: round1(escalation_rate),
        avg_resolution_time_hours: round1(avg_resolution_time_hours),
    }
}

/// Non-closed exceptions per severity
pub fn severity_breakdown(exceptions: &[Exception]) -> SeverityBreakdown {
    let mut breakdown = SeverityBreakdown::default();
    for e in exceptions
        .iter()
        .filter(|e| e.status != ExceptionStatus::Closed)
    {
        breakdown.add(e.severity);
    }
    breakdown
}

/// Open assigned work per user, busiest first
pub fn team_workload(exceptions: &[Exception], users: &[UserSummary]) -> Vec<WorkloadEntry> {
    let names: HashMap<i64, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();
    let mut counts: HashMap<i64, i64> = HashMap::new();
    for e in exceptions.iter().filter(|e| is_open(e)) {
        if let Some(user_id) = e.assigned_to_id {
            *counts.entry(user_id).or_default() += 1;
        }
    }

    let mut workload: Vec<WorkloadEntry> = counts
        .into_iter()
        .map(|(user_id, count)| WorkloadEntry {
            user_id,
            name: names.get(&user_id).copied().unwrap_or("Unknown").to_string(),
            count,
        })
        .collect();
    workload.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    workload
}

/// Open exceptions past their deadline, most overdue first
pub fn sla_breaches(exceptions: &[Exception], now: i64) -> Vec<SlaBreach> {
    let mut breaches: Vec<SlaBreach> = exceptions
        .iter()
        .filter(|e| is_open(e) && now > e.sla_deadline)
        .map(|e| SlaBreach {
            id: e.id,
            title: e.title.clone(),
            sla_deadline: e.sla_deadline,
            hours_overdue: (now - e.sla_deadline) / HOUR_MILLIS,
        })
        .collect();
    breaches.sort_by_key(|b| b.sla_deadline);
    breaches
}

/// Open CRITICAL exceptions
pub fn critical_exceptions(exceptions: &[Exception]) -> Vec<ExceptionBrief> {
    exceptions
        .iter()
        .filter(|e| e.severity == Severity::Critical && is_open(e))
        .map(ExceptionBrief::from)
        .collect()
}

/// Trend from stored snapshots plus a live "Today" point.
///
/// Each of the previous [`TREND_HISTORY_DAYS`] UTC days contributes the last
/// OPEN_EXCEPTIONS and SLA_COMPLIANCE values recorded that day; a day
/// missing either value is skipped.
pub fn trend(history: &[KpiMetric], live: &KpiSummary, now: i64) -> Vec<TrendPoint> {
    let today = utc_day(now);
    let first_day = today - TREND_HISTORY_DAYS;

    let mut days: BTreeMap<i64, (Option<(i64, f64)>, Option<(i64, f64)>)> = BTreeMap::new();
    for metric in history {
        let day = utc_day(metric.recorded_at);
        if day < first_day || day >= today {
            continue;
        }
        let slot = days.entry(day).or_default();
        let target = match metric.metric_type {
            MetricType::OpenExceptions => &mut slot.0,
            MetricType::SlaCompliance => &mut slot.1,
            _ => continue,
        };
        if target.is_none_or(|(at, _)| metric.recorded_at >= at) {
            *target = Some((metric.recorded_at, metric.metric_value));
        }
    }

    let mut points: Vec<TrendPoint> = days
        .into_iter()
        .filter_map(|(day, slot)| match slot {
            (Some((_, open)), Some((_, sla))) => Some(TrendPoint {
                date: day_label(day),
                open,
                sla,
            }),
            _ => None,
        })
        .collect();

    points.push(TrendPoint {
        date: "Today".to_string(),
        open: live.open_exceptions,
        sla: live.sla_compliance,
    });
    points
}

fn day_label(day: i64) -> String {
    DateTime::from_timestamp_millis(day * DAY_MILLIS)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| day.to_string())
}

/// Start of the window [`trend`] reads history from
pub fn trend_window_start(now: i64) -> i64 {
    (utc_day(now) - TREND_HISTORY_DAYS) * DAY_MILLIS
}

/// Full management report
pub fn compute_report(
    exceptions: &[Exception],
    users: &[UserSummary],
    history: &[KpiMetric],
    recent_activity: Vec<RecentActivity>,
    now: i64,
) -> KpiReport {
    let kpis = summarize(exceptions, now);
    KpiReport {
        trend_data: trend(history, &kpis, now),
        kpis,
        severity_breakdown: severity_breakdown(exceptions),
        team_workload: team_workload(exceptions, users),
        critical_exceptions: critical_exceptions(exceptions),
        sla_breaches: sla_breaches(exceptions, now),
        recent_activity,
        generated_at: now,
    }
}

/// The four headline figures as history rows stamped `now`
pub fn snapshot_metrics(summary: &KpiSummary, now: i64) -> Vec<KpiMetric> {
    [
        (MetricType::OpenExceptions, summary.open_exceptions),
        (MetricType::SlaCompliance, summary.sla_compliance),
        (MetricType::EscalationRate, summary.escalation_rate),
        (MetricType::AvgResolutionTime, summary.avg_resolution_time_hours),
    ]
    .into_iter()
    .map(|(metric_type, metric_value)| KpiMetric {
        id: snowflake_id(),
        metric_type,
        metric_value,
        recorded_at: now,
    })
    .collect()
}
