//! Activity log entries and performer name resolution.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use lf_core::constants::SYSTEM_ACTOR;
use lf_core::error::{LfError, LfResult};

use super::account::{Account, Role};
use super::{parse_timestamp, str_field};

/// Who performed a logged action. Exactly one actor column is set per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "lowercase")]
pub enum Actor {
    User(String),
    Security(String),
    Admin(String),
}

impl Actor {
    /// Build the actor for an account of the given role.
    pub fn for_role(role: Role, id: impl Into<String>) -> Self {
        match role {
            Role::User => Actor::User(id.into()),
            Role::Security => Actor::Security(id.into()),
            Role::Admin => Actor::Admin(id.into()),
        }
    }

    /// Foreign key column in `activity_logs`.
    pub fn column(&self) -> &'static str {
        match self {
            Actor::User(_) => "user_id",
            Actor::Security(_) => "security_id",
            Actor::Admin(_) => "admin_id",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Actor::User(id) | Actor::Security(id) | Actor::Admin(id) => id,
        }
    }
}

/// An append-only activity log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: Option<String>,
    pub security_id: Option<String>,
    pub admin_id: Option<String>,
    pub action: String,
    pub timestamp: DateTime<Utc>,

    /// Transient: resolved performer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
}

impl ActivityLog {
    pub fn from_remote(row: &Value) -> LfResult<Self> {
        let id = str_field(row, "id")
            .ok_or_else(|| LfError::Serialization("activity log missing id".into()))?;
        let timestamp = row
            .get("timestamp")
            .and_then(|v| v.as_str())
            .and_then(parse_timestamp)
            .ok_or_else(|| LfError::Serialization(format!("activity log {id} has no timestamp")))?;

        Ok(Self {
            id,
            user_id: str_field(row, "user_id"),
            security_id: str_field(row, "security_id"),
            admin_id: str_field(row, "admin_id"),
            action: str_field(row, "action").unwrap_or_default(),
            timestamp,
            performed_by: None,
        })
    }

    pub fn from_remote_rows(rows: &[Value]) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| Self::from_remote(row).ok())
            .collect()
    }

    /// Insert body for a new entry.
    pub fn insert_json(actor: &Actor, action: &str, timestamp: DateTime<Utc>) -> Value {
        let mut body = json!({
            "action": action,
            "timestamp": timestamp.to_rfc3339(),
        });
        body[actor.column()] = json!(actor.id());
        body
    }

    /// Resolved performer, or "System".
    pub fn performer(&self) -> &str {
        self.performed_by.as_deref().unwrap_or(SYSTEM_ACTOR)
    }

    /// Case-insensitive match over the action text and performer name.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        q.is_empty()
            || self.action.to_lowercase().contains(&q)
            || self.performer().to_lowercase().contains(&q)
    }
}

/// Id-to-name lookup for the three account tables.
#[derive(Debug, Clone, Default)]
pub struct ActorDirectory {
    users: HashMap<String, String>,
    security: HashMap<String, String>,
    admins: HashMap<String, String>,
}

impl ActorDirectory {
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        let mut dir = Self::default();
        for account in accounts {
            dir.insert(account.role, &account.id, &account.name);
        }
        dir
    }

    pub fn insert(&mut self, role: Role, id: &str, name: &str) {
        let map = match role {
            Role::User => &mut self.users,
            Role::Security => &mut self.security,
            Role::Admin => &mut self.admins,
        };
        map.insert(id.to_string(), name.to_string());
    }

    pub fn user_name(&self, id: &str) -> Option<&str> {
        self.users.get(id).map(String::as_str)
    }

    /// User name, else security name, else admin name.
    pub fn resolve(&self, log: &ActivityLog) -> Option<String> {
        let lookup = |id: &Option<String>, map: &HashMap<String, String>| {
            id.as_ref().and_then(|id| map.get(id)).cloned()
        };
        lookup(&log.user_id, &self.users)
            .or_else(|| lookup(&log.security_id, &self.security))
            .or_else(|| lookup(&log.admin_id, &self.admins))
    }

    /// Fill `performed_by` on every log.
    pub fn annotate(&self, logs: &mut [ActivityLog]) {
        for log in logs {
            log.performed_by = self.resolve(log);
        }
    }
}
