//! Activity log service.
//!
//! Reads the append-only `activity_logs` table and resolves performer names.
//! Writes go through [`record`], which never fails the calling operation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use lf_api::{Backend, Query};
use lf_core::constants::tables;
use lf_core::error::LfResult;
use lf_models::{Account, ActivityLog, Actor, ActorDirectory, Role};

use crate::service::{ensure_running, Service, ServiceState};

/// Append a log entry attributed to `actor`.
///
/// Failures are logged and reported as `false`; the caller's own write is
/// never rolled back.
pub async fn record(backend: &dyn Backend, actor: &Actor, action: &str) -> bool {
    let body = ActivityLog::insert_json(actor, action, Utc::now());
    match backend.insert(tables::ACTIVITY_LOGS, &body).await {
        Ok(_) => {
            debug!("activity logged: {action}");
            true
        }
        Err(e) => {
            warn!("failed to write activity log \"{action}\": {e}");
            false
        }
    }
}

/// Names of every account, for performer and reporter resolution.
///
/// A table that cannot be read leaves its ids unresolved.
pub(crate) async fn load_directory(backend: &dyn Backend) -> ActorDirectory {
    let mut accounts = Vec::new();
    for role in Role::ALL {
        let query = Query::table(role.table()).select("id,name");
        match backend.select(&query).await {
            Ok(rows) => accounts.extend(Account::from_remote_rows(role, &rows)),
            Err(e) => warn!("could not load {role} names: {e}"),
        }
    }
    ActorDirectory::from_accounts(&accounts)
}

/// Logs newest first, optionally truncated, with performer names filled in.
pub(crate) async fn fetch_logs(
    backend: &dyn Backend,
    limit: Option<usize>,
) -> LfResult<Vec<ActivityLog>> {
    let mut query = Query::table(tables::ACTIVITY_LOGS).order_desc("timestamp");
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let rows = backend.select(&query).await?;
    let mut logs = ActivityLog::from_remote_rows(&rows);
    load_directory(backend).await.annotate(&mut logs);
    Ok(logs)
}

/// Read access to the activity log.
pub struct ActivityService {
    state: ServiceState,
    backend: Arc<dyn Backend>,
}

impl ActivityService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
        }
    }

    /// The `limit` most recent entries.
    pub async fn recent(&self, limit: usize) -> LfResult<Vec<ActivityLog>> {
        ensure_running(self.name(), self.state)?;
        fetch_logs(self.backend.as_ref(), Some(limit)).await
    }

    /// Every entry, newest first.
    pub async fn all(&self) -> LfResult<Vec<ActivityLog>> {
        ensure_running(self.name(), self.state)?;
        fetch_logs(self.backend.as_ref(), None).await
    }

    /// Entries whose action or performer contains `query`.
    pub fn filter_logs(logs: &[ActivityLog], query: &str) -> Vec<ActivityLog> {
        logs.iter()
            .filter(|log| log.matches_query(query))
            .cloned()
            .collect()
    }
}

impl Service for ActivityService {
    fn name(&self) -> &str {
        "activity"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> LfResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }

    fn shutdown(&mut self) -> LfResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
