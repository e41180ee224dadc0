//! In-memory [`Backend`] for tests and offline use.
//!
//! Mirrors the hosted tables closely enough for the service layer: ids and
//! `created_at` are assigned on insert, account usernames and identifiers
//! are unique, rows referenced by reports or logs cannot be deleted, and the
//! `create_security_account` procedure is available. Individual tables and
//! the object store can be made to fail.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use lf_core::constants::{rpc, tables};
use lf_core::error::{LfError, LfResult};

use crate::backend::{Backend, UploadOptions};
use crate::query::Query;

/// Columns that must be unique per table.
const UNIQUE_COLUMNS: &[(&str, &[&str])] = &[
    (tables::USERS, &["username", "nim_nip"]),
    (tables::SECURITY_STAFF, &["username", "badge_number"]),
    (tables::ADMINS, &["username"]),
];

/// Tables and columns that reference an account table.
const REFERENCES: &[(&str, &[(&str, &str)])] = &[
    (
        tables::USERS,
        &[
            (tables::LOST_ITEMS, "user_id"),
            (tables::FOUND_ITEMS, "user_id"),
            (tables::ACTIVITY_LOGS, "user_id"),
        ],
    ),
    (tables::SECURITY_STAFF, &[(tables::ACTIVITY_LOGS, "security_id")]),
    (tables::ADMINS, &[(tables::ACTIVITY_LOGS, "admin_id")]),
];

const PUBLIC_BASE: &str = "memory://storage/v1/object/public";

/// Hosted tables held in memory.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_tables: Mutex<HashSet<String>>,
    fail_uploads: AtomicBool,
}

fn lock_err<T>(_: T) -> LfError {
    LfError::Internal("memory backend lock poisoned".into())
}

fn cell_str(row: &Value, col: &str) -> Option<String> {
    match row.get(col)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows exactly as given, bypassing id assignment and constraints.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.entry(table.to_string()).or_default().extend(rows);
        }
    }

    /// Make every call touching `table` fail with a backend error.
    pub fn fail_table(&self, table: &str) {
        if let Ok(mut failing) = self.failing_tables.lock() {
            failing.insert(table.to_string());
        }
    }

    /// Make object uploads fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Paths of stored objects, as `bucket/path`.
    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn check_available(&self, table: &str) -> LfResult<()> {
        let failing = self.failing_tables.lock().map_err(lock_err)?;
        if failing.contains(table) {
            return Err(LfError::Backend {
                status: 503,
                message: format!("table {table} unavailable"),
            });
        }
        Ok(())
    }

    fn check_unique(
        table: &str,
        rows: &[Value],
        candidate: &Value,
        skip_id: Option<&str>,
    ) -> LfResult<()> {
        let Some((_, columns)) = UNIQUE_COLUMNS.iter().find(|(t, _)| *t == table) else {
            return Ok(());
        };
        for col in *columns {
            let Some(value) = cell_str(candidate, col) else {
                continue;
            };
            let clash = rows.iter().any(|row| {
                cell_str(row, "id").as_deref() != skip_id
                    && cell_str(row, col).as_deref() == Some(value.as_str())
            });
            if clash {
                return Err(LfError::DuplicateKey(format!(
                    "duplicate key value violates unique constraint \"{table}_{col}_key\""
                )));
            }
        }
        Ok(())
    }

    fn insert_locked(
        store: &mut HashMap<String, Vec<Value>>,
        table: &str,
        row: &Value,
    ) -> LfResult<Value> {
        let mut stored = match row {
            Value::Object(_) => row.clone(),
            _ => {
                return Err(LfError::Backend {
                    status: 400,
                    message: "insert body must be an object".into(),
                })
            }
        };

        let rows = store.entry(table.to_string()).or_default();
        Self::check_unique(table, rows, &stored, None)?;

        if cell_str(&stored, "id").is_none() {
            stored["id"] = json!(uuid::Uuid::new_v4().to_string());
        }
        if table != tables::ACTIVITY_LOGS && stored.get("created_at").map_or(true, Value::is_null) {
            stored["created_at"] = json!(Utc::now().to_rfc3339());
        }
        if table == tables::ACTIVITY_LOGS && stored.get("timestamp").map_or(true, Value::is_null) {
            stored["timestamp"] = json!(Utc::now().to_rfc3339());
        }

        rows.push(stored.clone());
        debug!("memory insert into {table}");
        Ok(stored)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Query) -> LfResult<Vec<Value>> {
        self.check_available(&query.table)?;
        let tables = self.tables.lock().map_err(lock_err)?;
        Ok(tables
            .get(&query.table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn count(&self, query: &Query) -> LfResult<u64> {
        self.check_available(&query.table)?;
        let tables = self.tables.lock().map_err(lock_err)?;
        Ok(tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, table: &str, row: &Value) -> LfResult<Value> {
        self.check_available(table)?;
        let mut store = self.tables.lock().map_err(lock_err)?;
        Self::insert_locked(&mut store, table, row)
    }

    async fn update(&self, query: &Query, patch: &Value) -> LfResult<Vec<Value>> {
        self.check_available(&query.table)?;
        let Value::Object(fields) = patch else {
            return Err(LfError::Backend {
                status: 400,
                message: "patch body must be an object".into(),
            });
        };

        let mut tables = self.tables.lock().map_err(lock_err)?;
        let rows = tables.entry(query.table.clone()).or_default();

        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| query.matches(r))
            .map(|(i, _)| i)
            .collect();

        for &i in &targets {
            let mut candidate = rows[i].clone();
            for (k, v) in fields {
                candidate[k.as_str()] = v.clone();
            }
            let id = cell_str(&candidate, "id");
            Self::check_unique(&query.table, rows, &candidate, id.as_deref())?;
        }

        let mut updated = Vec::with_capacity(targets.len());
        for i in targets {
            for (k, v) in fields {
                rows[i][k.as_str()] = v.clone();
            }
            updated.push(rows[i].clone());
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> LfResult<u64> {
        self.check_available(&query.table)?;
        let mut tables = self.tables.lock().map_err(lock_err)?;

        let doomed: Vec<String> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.matches(r))
                    .filter_map(|r| cell_str(r, "id"))
                    .collect()
            })
            .unwrap_or_default();

        if let Some((_, refs)) = REFERENCES.iter().find(|(t, _)| *t == query.table) {
            for (ref_table, col) in *refs {
                let referenced = tables.get(*ref_table).is_some_and(|rows| {
                    rows.iter().any(|r| {
                        cell_str(r, col).is_some_and(|v| doomed.contains(&v))
                    })
                });
                if referenced {
                    return Err(LfError::ForeignKey(format!(
                        "update or delete on table \"{}\" violates foreign key constraint on table \"{ref_table}\"",
                        query.table
                    )));
                }
            }
        }

        let rows = tables.entry(query.table.clone()).or_default();
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn rpc(&self, function: &str, args: &Value) -> LfResult<Value> {
        match function {
            rpc::CREATE_SECURITY_ACCOUNT => {
                self.check_available(tables::SECURITY_STAFF)?;
                let arg = |name: &str| {
                    args.get(name)
                        .and_then(|v| v.as_str())
                        .map(String::from)
                        .ok_or_else(|| LfError::Backend {
                            status: 400,
                            message: format!("missing argument {name}"),
                        })
                };
                let row = json!({
                    "name": arg("p_nama")?,
                    "badge_number": arg("p_nim_nip")?,
                    "username": arg("p_username")?,
                    "password": arg("p_password")?,
                });
                let mut store = self.tables.lock().map_err(lock_err)?;
                let stored = Self::insert_locked(&mut store, tables::SECURITY_STAFF, &row)?;
                Ok(stored.get("id").cloned().unwrap_or(Value::Null))
            }
            other => Err(LfError::Backend {
                status: 404,
                message: format!("function {other} does not exist"),
            }),
        }
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> LfResult<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(LfError::Storage(format!("bucket {bucket} rejected {path}")));
        }
        let key = format!("{bucket}/{path}");
        let mut objects = self.objects.lock().map_err(lock_err)?;
        if !options.upsert && objects.contains_key(&key) {
            return Err(LfError::Storage(format!("{key} already exists")));
        }
        objects.insert(key.clone(), bytes);
        Ok(format!("{PUBLIC_BASE}/{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> UploadOptions {
        UploadOptions {
            content_type: "image/png".into(),
            cache_control_secs: 3600,
            upsert: true,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let backend = MemoryBackend::new();
        let row = backend
            .insert(tables::LOST_ITEMS, &json!({"name": "Phone"}))
            .await
            .unwrap();
        assert!(row["id"].is_string());
        assert!(row["created_at"].is_string());
        assert_eq!(backend.count(&Query::table(tables::LOST_ITEMS)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_username() {
        let backend = MemoryBackend::new();
        backend
            .insert(tables::USERS, &json!({"username": "ana", "nim_nip": "1"}))
            .await
            .unwrap();
        let err = backend
            .insert(tables::USERS, &json!({"username": "ana", "nim_nip": "2"}))
            .await
            .unwrap_err();
        assert!(matches!(err, LfError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_referenced_account_cannot_be_deleted() {
        let backend = MemoryBackend::new();
        backend.seed(tables::USERS, vec![json!({"id": "u1", "username": "ana"})]);
        backend.seed(tables::LOST_ITEMS, vec![json!({"id": "r1", "user_id": "u1"})]);

        let err = backend
            .delete(&Query::table(tables::USERS).eq("id", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LfError::ForeignKey(_)));
        assert_eq!(backend.rows(tables::USERS).len(), 1);
    }

    #[tokio::test]
    async fn test_update_returns_rows() {
        let backend = MemoryBackend::new();
        backend.seed(
            tables::FOUND_ITEMS,
            vec![
                json!({"id": "r1", "status": "reported"}),
                json!({"id": "r2", "status": "reported"}),
            ],
        );
        let updated = backend
            .update(
                &Query::table(tables::FOUND_ITEMS).eq("id", "r2"),
                &json!({"status": "verified"}),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(backend.rows(tables::FOUND_ITEMS)[1]["status"], "verified");
    }

    #[tokio::test]
    async fn test_security_rpc() {
        let backend = MemoryBackend::new();
        let args = json!({
            "p_nama": "Budi",
            "p_nim_nip": "SEC-1",
            "p_username": "budi",
            "p_password": "secret1",
        });
        backend.rpc(rpc::CREATE_SECURITY_ACCOUNT, &args).await.unwrap();
        let rows = backend.rows(tables::SECURITY_STAFF);
        assert_eq!(rows[0]["badge_number"], "SEC-1");
        assert!(backend.rpc("nope", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MemoryBackend::new();
        backend.fail_table(tables::ACTIVITY_LOGS);
        assert!(backend.insert(tables::ACTIVITY_LOGS, &json!({})).await.is_err());

        let url = backend
            .upload_object("item-images", "u1_1.png", vec![1, 2], &opts())
            .await
            .unwrap();
        assert!(url.ends_with("item-images/u1_1.png"));
        backend.fail_uploads(true);
        assert!(backend
            .upload_object("item-images", "u1_2.png", vec![1], &opts())
            .await
            .is_err());
    }
}
