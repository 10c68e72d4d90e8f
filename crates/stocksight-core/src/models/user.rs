use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access level of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Role {
    Admin,
    Manager,
    Viewer,
}

impl Role {
    /// All roles, in decreasing order of privilege.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Viewer];

    /// Wire name, also used as the `{role}` path segment of `/auth/demo/{role}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Viewer => "viewer",
        }
    }

    /// Get the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Manager => "Manager",
            Role::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!(
                "Invalid role '{}'. Use 'admin', 'manager', or 'viewer'",
                other
            )),
        }
    }
}

/// The authenticated user as reported by `GET /auth/me`.
///
/// Never constructed from client-side state alone; a fresh copy is fetched
/// after every credential change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Identity {
    /// Backends that key users by username omit this field.
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name to greet the user with, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Response of every credential exchange (login, register, demo login).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
