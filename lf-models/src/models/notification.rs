//! Local per-user notifications.
//!
//! Notifications are never synced to the backend. They are stored in the
//! local SQLite database and listed newest first.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use lf_core::error::{LfError, LfResult};

use super::parse_timestamp;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Report,
    Verification,
    Match,
    Return,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Report => "report",
            NotificationKind::Verification => "verification",
            NotificationKind::Match => "match",
            NotificationKind::Return => "return",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = LfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(NotificationKind::Report),
            "verification" => Ok(NotificationKind::Verification),
            "match" => Ok(NotificationKind::Match),
            "return" => Ok(NotificationKind::Return),
            other => Err(LfError::Serialization(format!(
                "unknown notification kind: {other}"
            ))),
        }
    }
}

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub item_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when adding a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub message: String,
    pub kind: NotificationKind,
    pub item_id: Option<String>,
}

impl Notification {
    /// Construct a Notification from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let kind: String = row.get("kind")?;
        let created_at: String = row.get("created_at")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            message: row.get("message")?,
            kind: kind.parse().unwrap_or(NotificationKind::Report),
            item_id: row.get("item_id")?,
            is_read: row.get::<_, i64>("is_read")? != 0,
            created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
        })
    }

    /// Insert a new notification for `user_id`, returning it.
    pub fn insert(conn: &Connection, user_id: &str, new: NewNotification) -> LfResult<Self> {
        let notification = Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            message: new.message,
            kind: new.kind,
            item_id: new.item_id,
            is_read: false,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO notifications (id, user_id, message, kind, item_id, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                notification.id,
                notification.user_id,
                notification.message,
                notification.kind.as_str(),
                notification.item_id,
                notification.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| LfError::Database(e.to_string()))?;

        Ok(notification)
    }

    /// All notifications for a user, newest first.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> LfResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM notifications WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| LfError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([user_id], Self::from_row)
            .map_err(|e| LfError::Database(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| LfError::Database(e.to_string()))
    }

    /// Mark one notification read. Returns false if it does not exist for this user.
    pub fn mark_read(conn: &Connection, user_id: &str, id: &str) -> LfResult<bool> {
        let changed = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )
            .map_err(|e| LfError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Mark every notification of a user read. Returns the number changed.
    pub fn mark_all_read(conn: &Connection, user_id: &str) -> LfResult<usize> {
        conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            [user_id],
        )
        .map_err(|e| LfError::Database(e.to_string()))
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> LfResult<bool> {
        let changed = conn
            .execute(
                "DELETE FROM notifications WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )
            .map_err(|e| LfError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Remove all notifications of a user. Returns the number removed.
    pub fn clear(conn: &Connection, user_id: &str) -> LfResult<usize> {
        conn.execute("DELETE FROM notifications WHERE user_id = ?1", [user_id])
            .map_err(|e| LfError::Database(e.to_string()))
    }

    pub fn unread_count(conn: &Connection, user_id: &str) -> LfResult<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|e| LfError::Database(e.to_string()))
    }
}
