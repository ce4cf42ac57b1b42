//! User and credential model definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// How long a password reset link stays valid
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// The two roles of the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    FleetAdmin,
    CrewMember,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FleetAdmin => "FLEET_ADMIN",
            Self::CrewMember => "CREW_MEMBER",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::FleetAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FLEET_ADMIN" => Ok(Self::FleetAdmin),
            "CREW_MEMBER" => Ok(Self::CrewMember),
            _ => Err(Error::InvalidInput(format!("Unsupported role '{}'", value))),
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user; the email is normalized to lowercase
    pub fn new(email: impl AsRef<str>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.as_ref().trim().to_lowercase(),
            password_hash: password_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }
}

/// A single-use password reset token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn new(user_id: Uuid, token: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token: token.into(),
            expires_at: Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
