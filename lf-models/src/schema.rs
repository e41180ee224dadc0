//! Local SQLite schema.
//!
//! Only client-side state lives here: the sign-in session and the
//! notification list. Reports, accounts and activity logs are remote.

use lf_core::error::{LfError, LfResult};
use rusqlite::Connection;
use tracing::info;

/// Create all local tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> LfResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| LfError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> LfResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS notifications;
         DROP TABLE IF EXISTS session;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| LfError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Signed-in account; a single row in slot 1
CREATE TABLE IF NOT EXISTS session (
    slot            INTEGER PRIMARY KEY CHECK (slot = 1),
    account_id      TEXT NOT NULL,
    username        TEXT NOT NULL,
    name            TEXT NOT NULL,
    role            TEXT NOT NULL,
    signed_in_at    TEXT NOT NULL
);

-- Per-user notifications, never synced
CREATE TABLE IF NOT EXISTS notifications (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    message         TEXT NOT NULL,
    kind            TEXT NOT NULL,
    item_id         TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at);
"#;
