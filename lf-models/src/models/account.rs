//! Account models for the three roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lf_core::constants::tables;
use lf_core::error::{LfError, LfResult};

use super::{parse_timestamp, str_field};

/// Role of an account. Each role has its own remote table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Security,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Security, Role::Admin];

    pub fn table(&self) -> &'static str {
        match self {
            Role::User => tables::USERS,
            Role::Security => tables::SECURITY_STAFF,
            Role::Admin => tables::ADMINS,
        }
    }

    /// Column holding the role's identifier (NIM/NIP or badge number).
    /// Admins have none.
    pub fn identifier_column(&self) -> Option<&'static str> {
        match self {
            Role::User => Some("nim_nip"),
            Role::Security => Some("badge_number"),
            Role::Admin => None,
        }
    }

    /// Human name of the identifier.
    pub fn identifier_label(&self) -> &'static str {
        match self {
            Role::User => "NIM/NIP",
            Role::Security => "Badge number",
            Role::Admin => "-",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Security => "security",
            Role::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Security => "Security",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "security" | "satpam" => Ok(Role::Security),
            "admin" => Ok(Role::Admin),
            _ => Err(LfError::Validation(vec!["Please select a role.".to_string()])),
        }
    }
}

/// An account row from one of the role tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub username: String,
    /// NIM/NIP for users, badge number for security staff.
    pub identifier: Option<String>,
    /// Stored credential, compared verbatim at sign-in. Never serialized.
    #[serde(skip)]
    pub password: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Decode a row from the role's table.
    pub fn from_remote(role: Role, row: &Value) -> LfResult<Self> {
        let id = str_field(row, "id")
            .ok_or_else(|| LfError::Serialization(format!("{role} account missing id")))?;

        Ok(Self {
            id,
            role,
            name: str_field(row, "name").unwrap_or_default(),
            username: str_field(row, "username").unwrap_or_default(),
            identifier: role
                .identifier_column()
                .and_then(|col| str_field(row, col)),
            password: str_field(row, "password").unwrap_or_default(),
            created_at: row
                .get("created_at")
                .and_then(|v| v.as_str())
                .and_then(parse_timestamp),
        })
    }

    /// Decode a list of rows, skipping malformed ones.
    pub fn from_remote_rows(role: Role, rows: &[Value]) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| Self::from_remote(role, row).ok())
            .collect()
    }

    /// Whether the supplied password matches the stored one.
    pub fn password_matches(&self, candidate: &str) -> bool {
        !self.password.is_empty() && self.password == candidate
    }

    /// Case-insensitive match over name, username and identifier.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q)
            || self.username.to_lowercase().contains(&q)
            || self
                .identifier
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains(&q))
    }
}
