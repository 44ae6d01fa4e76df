//! KPI Models
//!
//! Aggregated metrics served to management and supervisors, plus the
//! historical snapshot rows they are trended from.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::exception::{EscalationLevel, Exception, ExceptionStatus, Severity};
use super::user::UserSummary;

/// Kind of a stored KPI snapshot value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MetricType {
    OpenExceptions,
    SlaCompliance,
    EscalationRate,
    AvgResolutionTime,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenExceptions => "OPEN_EXCEPTIONS",
            Self::SlaCompliance => "SLA_COMPLIANCE",
            Self::EscalationRate => "ESCALATION_RATE",
            Self::AvgResolutionTime => "AVG_RESOLUTION_TIME",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Historical KPI snapshot row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct KpiMetric {
    pub id: i64,
    pub metric_type: MetricType,
    pub metric_value: f64,
    pub recorded_at: i64,
}

/// Headline figures, each rounded to one decimal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct KpiSummary {
    pub open_exceptions: f64,
    /// Percent of active exceptions within SLA
    pub sla_compliance: f64,
    /// Percent of exceptions above LEVEL_1
    pub escalation_rate: f64,
    pub avg_resolution_time_hours: f64,
}

/// One point of the open/compliance trend chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    /// "YYYY-MM-DD" for history, "Today" for the live point
    pub date: String,
    pub open: f64,
    pub sla: f64,
}

/// Non-closed exception counts per severity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SeverityBreakdown {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl SeverityBreakdown {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

/// Open work per assignee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadEntry {
    pub user_id: i64,
    pub name: String,
    pub count: i64,
}

/// Compact exception reference used inside reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionBrief {
    pub id: i64,
    pub title: String,
    pub severity: Severity,
    pub status: ExceptionStatus,
    pub escalation_level: EscalationLevel,
    pub sla_deadline: i64,
    pub assigned_to_id: Option<i64>,
}

impl From<&Exception> for ExceptionBrief {
    fn from(e: &Exception) -> Self {
        Self {
            id: e.id,
            title: e.title.clone(),
            severity: e.severity,
            status: e.status,
            escalation_level: e.escalation_level,
            sla_deadline: e.sla_deadline,
            assigned_to_id: e.assigned_to_id,
        }
    }
}

/// Open exception past its deadline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlaBreach {
    pub id: i64,
    pub title: String,
    pub sla_deadline: i64,
    /// Whole hours past the deadline
    pub hours_overdue: i64,
}

/// Activity row joined with its exception title and actor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecentActivity {
    pub id: i64,
    pub exception_id: i64,
    pub exception_title: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub action: String,
    pub description: String,
    pub created_at: i64,
}

/// Full KPI report (management view)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiReport {
    pub kpis: KpiSummary,
    pub trend_data: Vec<TrendPoint>,
    pub severity_breakdown: SeverityBreakdown,
    pub team_workload: Vec<WorkloadEntry>,
    pub critical_exceptions: Vec<ExceptionBrief>,
    pub sla_breaches: Vec<SlaBreach>,
    pub recent_activity: Vec<RecentActivity>,
    pub generated_at: i64,
}

/// Supervisor dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorDashboard {
    /// Exceptions above LEVEL_1
    pub escalated_items: i64,
    pub sla_breaches: i64,
    pub team_workload: Vec<WorkloadEntry>,
    /// Five newest escalated exceptions
    pub recent_escalations: Vec<ExceptionBrief>,
}

/// Operational dashboard, over the caller's assignments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationalDashboard {
    pub my_assignments: i64,
    pub critical: i64,
    /// Deadline falls on today's UTC date
    pub due_today: i64,
    pub resolved: i64,
    pub assignments: Vec<ExceptionBrief>,
}

/// Role-conditioned dashboard payload, tagged by `role`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardView {
    Management(KpiReport),
    Supervisor(SupervisorDashboard),
    Operational(OperationalDashboard),
}

/// Dashboard payload for the requesting user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub view: DashboardView,
}
