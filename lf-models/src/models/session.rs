//! The locally persisted sign-in session.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use lf_core::error::{LfError, LfResult};

use super::account::{Account, Role};
use super::parse_timestamp;

/// The signed-in account. At most one session is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account_id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn for_account(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            username: account.username.clone(),
            name: account.name.clone(),
            role: account.role,
            signed_in_at: Utc::now(),
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let role: String = row.get("role")?;
        let signed_in_at: String = row.get("signed_in_at")?;
        Ok(Self {
            account_id: row.get("account_id")?,
            username: row.get("username")?,
            name: row.get("name")?,
            role: role.parse().unwrap_or(Role::User),
            signed_in_at: parse_timestamp(&signed_in_at).unwrap_or_else(Utc::now),
        })
    }

    /// Load the stored session, if any.
    pub fn load(conn: &Connection) -> LfResult<Option<Self>> {
        match conn.query_row("SELECT * FROM session WHERE slot = 1", [], Self::from_row) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LfError::Database(e.to_string())),
        }
    }

    /// Store this session, replacing any previous one.
    pub fn save(&self, conn: &Connection) -> LfResult<()> {
        conn.execute(
            "INSERT INTO session (slot, account_id, username, name, role, signed_in_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slot) DO UPDATE SET
                account_id = excluded.account_id,
                username = excluded.username,
                name = excluded.name,
                role = excluded.role,
                signed_in_at = excluded.signed_in_at",
            params![
                self.account_id,
                self.username,
                self.name,
                self.role.as_str(),
                self.signed_in_at.to_rfc3339(),
            ],
        )
        .map_err(|e| LfError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove the stored session. Returns whether one existed.
    pub fn clear(conn: &Connection) -> LfResult<bool> {
        let changed = conn
            .execute("DELETE FROM session", [])
            .map_err(|e| LfError::Database(e.to_string()))?;
        Ok(changed > 0)
    }
}
