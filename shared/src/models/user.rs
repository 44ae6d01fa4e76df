//! User Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Role of a dashboard user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum UserRole {
    Management,
    Supervisor,
    Operational,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Management => "MANAGEMENT",
            Self::Supervisor => "SUPERVISOR",
            Self::Operational => "OPERATIONAL",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANAGEMENT" => Ok(Self::Management),
            "SUPERVISOR" => Ok(Self::Supervisor),
            "OPERATIONAL" => Ok(Self::Operational),
            _ => Err(AppError::validation(format!("Unknown role: {s}")).with_detail("value", s)),
        }
    }
}

/// User record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    /// Stored lowercase
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub created_at: i64,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
        }
    }
}

/// Public view of a user, embedded in exception and activity responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("SUPERVISOR".parse::<UserRole>().unwrap(), UserRole::Supervisor);
        assert!("ADMIN".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Operational.to_string(), "OPERATIONAL");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: 1,
            email: "ops@example.com".into(),
            name: "Ops".into(),
            role: UserRole::Operational,
            avatar: None,
            hashed_password: "$argon2id$secret".into(),
            created_at: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"OPERATIONAL\""));
    }
}
