//! Role capabilities
//!
//! Roles never get compared as strings in handlers; each role maps to a
//! fixed capability set and handlers ask for the capability they need.

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Exception, UserRole};

use super::jwt::Claims;

/// Something a role is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// List and read every exception
    ViewAllExceptions,
    /// List and read exceptions assigned to oneself
    ViewAssignedExceptions,
    DeleteExceptions,
    ViewKpis,
    RecordKpiSnapshots,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ViewAllExceptions => "exceptions:view_all",
            Self::ViewAssignedExceptions => "exceptions:view_assigned",
            Self::DeleteExceptions => "exceptions:delete",
            Self::ViewKpis => "kpis:view",
            Self::RecordKpiSnapshots => "kpis:snapshot",
        }
    }
}

/// Capability set of a role
pub fn capabilities(role: UserRole) -> &'static [Capability] {
    use Capability::*;
    match role {
        UserRole::Management => &[
            ViewAllExceptions,
            DeleteExceptions,
            RecordKpiSnapshots,
            ViewKpis,
        ],
        UserRole::Supervisor => &[ViewAllExceptions, ViewKpis],
        UserRole::Operational => &[ViewAssignedExceptions],
    }
}

/// Authenticated caller, injected by `require_auth`
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn has(&self, capability: Capability) -> bool {
        capabilities(self.role).contains(&capability)
    }

    /// `PermissionDenied` unless the caller's role grants `capability`
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.has(capability) {
            return Ok(());
        }
        crate::security_log!(
            "WARN",
            "permission_denied",
            user_id = self.id,
            role = self.role.as_str(),
            capability = capability.name()
        );
        Err(AppError::permission_denied(format!(
            "Role {} lacks permission {}",
            self.role,
            capability.name()
        ))
        .with_detail("required", capability.name()))
    }

    /// Whether the caller may open an exception directly.
    ///
    /// Assigned-only roles also reach exceptions they created themselves.
    pub fn can_view(&self, exception: &Exception) -> bool {
        match ListScope::for_user(self) {
            ListScope::All => true,
            ListScope::AssignedTo(id) => {
                exception.assigned_to_id == Some(id) || exception.created_by_id == id
            }
            ListScope::Nothing => false,
        }
    }

    /// `PermissionDenied` unless [`Self::can_view`] holds
    pub fn require_view(&self, exception: &Exception) -> AppResult<()> {
        if self.can_view(exception) {
            return Ok(());
        }
        Err(AppError::permission_denied(
            "Exception is not assigned to you",
        ))
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.sub.parse()?,
            name: claims.name,
            role: claims.role,
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))
    }
}

/// Rows a caller may see in exception lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    AssignedTo(i64),
    Nothing,
}

impl ListScope {
    pub fn for_user(user: &CurrentUser) -> Self {
        if user.has(Capability::ViewAllExceptions) {
            ListScope::All
        } else if user.has(Capability::ViewAssignedExceptions) {
            ListScope::AssignedTo(user.id)
        } else {
            ListScope::Nothing
        }
    }

    /// Combine the scope with an explicit `assigned_to` filter.
    ///
    /// `None` means the combination can match nothing.
    pub fn assignee_filter(&self, requested: Option<i64>) -> Option<Option<i64>> {
        match self {
            ListScope::All => Some(requested),
            ListScope::AssignedTo(id) => Some(Some(*id)),
            ListScope::Nothing => None,
        }
    }
}
