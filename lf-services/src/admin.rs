//! Admin dashboard: aggregate statistics, account management and report
//! oversight.
//!
//! Every account change is followed by a best-effort activity-log entry.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use lf_api::{Backend, Query};
use lf_core::constants::{rpc, MONTHLY_STATS_MONTHS};
use lf_core::error::{LfError, LfResult};
use lf_models::{
    Account, AccountForm, AccountUpdate, Actor, Report, ReportKind, ReportStatus, Role,
};

use crate::activity::record;
use crate::event_bus::{AppEvent, EventBus};
use crate::reports::{attach_reporters, fetch_reports};
use crate::service::{ensure_running, Service, ServiceState};
use crate::stats::{empty_buckets, month_start, monthly_buckets, MonthlyBucket, StatusCounts};

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// Accounts across all three roles.
    pub total_users: u64,
    pub regular: u64,
    pub security: u64,
    pub admin: u64,
    pub total_reports: u64,
    pub lost: u64,
    pub found: u64,
    pub by_status: StatusCounts,
}

/// Result of an account create, update or delete.
#[derive(Debug, Clone, Serialize)]
pub struct AccountChange {
    pub role: Role,
    pub account_id: String,
    pub name: String,
    pub username: String,
    /// Whether the activity-log entry was written.
    pub log_written: bool,
}

/// Id returned by the account procedure: a bare value or `{ "id": ... }`.
fn rpc_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(rpc_id),
        Value::Array(items) => items.first().and_then(rpc_id),
        _ => None,
    }
}

pub struct AdminService {
    state: ServiceState,
    backend: Arc<dyn Backend>,
    event_bus: EventBus,
}

impl AdminService {
    pub fn new(backend: Arc<dyn Backend>, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
            event_bus,
        }
    }

    fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub async fn stats(&self) -> LfResult<AdminStats> {
        ensure_running(self.name(), self.state)?;
        let backend = self.backend();

        let regular = backend.count(&Query::table(Role::User.table())).await?;
        let security = backend.count(&Query::table(Role::Security.table())).await?;
        let admin = backend.count(&Query::table(Role::Admin.table())).await?;

        let mut by_status = StatusCounts::default();
        let mut per_kind = [0u64; 2];
        for (i, kind) in ReportKind::ALL.iter().enumerate() {
            per_kind[i] = backend.count(&Query::table(kind.table())).await?;
            for status in ReportStatus::ALL {
                let query = Query::table(kind.table()).eq("status", status.as_str());
                let n = backend.count(&query).await?;
                match status {
                    ReportStatus::Reported => by_status.reported += n,
                    ReportStatus::Verified => by_status.verified += n,
                    ReportStatus::Matched => by_status.matched += n,
                    ReportStatus::Returned => by_status.returned += n,
                }
            }
        }

        Ok(AdminStats {
            total_users: regular + security + admin,
            regular,
            security,
            admin,
            total_reports: per_kind[0] + per_kind[1],
            lost: per_kind[0],
            found: per_kind[1],
            by_status,
        })
    }

    /// Newest regular and security accounts.
    pub async fn recent_users(&self, limit: usize) -> LfResult<Vec<Account>> {
        ensure_running(self.name(), self.state)?;
        let mut accounts = Vec::new();
        for role in [Role::User, Role::Security] {
            let query = Query::table(role.table())
                .order_desc("created_at")
                .limit(limit);
            let rows = self.backend().select(&query).await?;
            accounts.extend(Account::from_remote_rows(role, &rows));
        }
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        accounts.truncate(limit);
        Ok(accounts)
    }

    /// Newest reports from both tables, with reporters.
    pub async fn recent_reports(&self, limit: usize) -> LfResult<Vec<Report>> {
        ensure_running(self.name(), self.state)?;
        let mut reports =
            fetch_reports(self.backend(), &ReportKind::ALL, |q| q.limit(limit)).await?;
        reports.truncate(limit);
        attach_reporters(self.backend(), &mut reports).await;
        Ok(reports)
    }

    pub async fn all_reports(&self) -> LfResult<Vec<Report>> {
        ensure_running(self.name(), self.state)?;
        let mut reports = fetch_reports(self.backend(), &ReportKind::ALL, |q| q).await?;
        attach_reporters(self.backend(), &mut reports).await;
        Ok(reports)
    }

    /// Accounts of one role or all three, filtered by name, username or
    /// identifier.
    pub async fn list_accounts(
        &self,
        role: Option<Role>,
        query: Option<&str>,
    ) -> LfResult<Vec<Account>> {
        ensure_running(self.name(), self.state)?;
        let roles = role.map_or_else(|| Role::ALL.to_vec(), |r| vec![r]);
        let mut accounts = Vec::new();
        for role in roles {
            let q = Query::table(role.table()).order_desc("created_at");
            let rows = self.backend().select(&q).await?;
            accounts.extend(
                Account::from_remote_rows(role, &rows)
                    .into_iter()
                    .filter(|a| a.matches_query(query.unwrap_or_default())),
            );
        }
        Ok(accounts)
    }

    async fn find_account(&self, role: Role, id: &str) -> LfResult<Account> {
        let query = Query::table(role.table()).eq("id", id).limit(1);
        let rows = self.backend().select(&query).await?;
        rows.first()
            .map(|row| Account::from_remote(role, row))
            .transpose()?
            .ok_or_else(|| LfError::NotFound(format!("{role} account {id}")))
    }

    /// Create a regular or security account.
    pub async fn create_account(
        &self,
        form: &AccountForm,
        admin_id: &str,
    ) -> LfResult<AccountChange> {
        ensure_running(self.name(), self.state)?;
        form.validate()?;

        let name = form.name.trim();
        let username = form.username.trim();
        let identifier = form.identifier.trim();

        let account_id = match form.role {
            Role::Security => {
                let args = json!({
                    "p_nama": name,
                    "p_nim_nip": identifier,
                    "p_username": username,
                    "p_password": form.password,
                });
                let result = self.backend().rpc(rpc::CREATE_SECURITY_ACCOUNT, &args).await?;
                rpc_id(&result).unwrap_or_default()
            }
            _ => {
                let body = json!({
                    "name": name,
                    "nim_nip": identifier,
                    "username": username,
                    "password": form.password,
                });
                let row = self.backend().insert(Role::User.table(), &body).await?;
                Account::from_remote(Role::User, &row)?.id
            }
        };

        info!("created {} account {username}", form.role);
        let log_written = record(
            self.backend(),
            &Actor::Admin(admin_id.to_string()),
            &format!("Created new {} account for {name} ({username})", form.role),
        )
        .await;
        self.event_bus.emit(AppEvent::AccountCreated {
            role: form.role,
            username: username.to_string(),
        });

        Ok(AccountChange {
            role: form.role,
            account_id,
            name: name.to_string(),
            username: username.to_string(),
            log_written,
        })
    }

    /// Edit an account. The password is only changed when supplied.
    pub async fn update_account(
        &self,
        role: Role,
        id: &str,
        update: &AccountUpdate,
        admin_id: &str,
    ) -> LfResult<AccountChange> {
        ensure_running(self.name(), self.state)?;
        update.validate(role)?;

        let query = Query::table(role.table()).eq("id", id);
        let rows = self
            .backend()
            .update(&query, &update.to_patch_json(role))
            .await?;
        let account = rows
            .first()
            .map(|row| Account::from_remote(role, row))
            .transpose()?
            .ok_or_else(|| LfError::NotFound(format!("{role} account {id}")))?;

        info!("updated {role} account {id}");
        let log_written = record(
            self.backend(),
            &Actor::Admin(admin_id.to_string()),
            &format!(
                "Updated {role} account: {} ({})",
                account.name, account.username
            ),
        )
        .await;
        self.event_bus.emit(AppEvent::AccountUpdated {
            role,
            account_id: id.to_string(),
        });

        Ok(AccountChange {
            role,
            account_id: account.id,
            name: account.name,
            username: account.username,
            log_written,
        })
    }

    /// Delete an account. Accounts still referenced by reports or logs are
    /// refused by the backend.
    pub async fn delete_account(
        &self,
        role: Role,
        id: &str,
        admin_id: &str,
    ) -> LfResult<AccountChange> {
        ensure_running(self.name(), self.state)?;
        let account = self.find_account(role, id).await?;

        let removed = self.backend().delete(&Query::table(role.table()).eq("id", id)).await?;
        if removed == 0 {
            return Err(LfError::NotFound(format!("{role} account {id}")));
        }

        info!("deleted {role} account {id}");
        let log_written = record(
            self.backend(),
            &Actor::Admin(admin_id.to_string()),
            &format!(
                "Deleted {role} account: {} ({})",
                account.name, account.username
            ),
        )
        .await;
        self.event_bus.emit(AppEvent::AccountDeleted {
            role,
            account_id: id.to_string(),
        });

        Ok(AccountChange {
            role,
            account_id: account.id,
            name: account.name,
            username: account.username,
            log_written,
        })
    }

    /// Lost, found and returned counts for the six months ending with
    /// `today`'s, oldest first. Backend failures yield empty buckets.
    pub async fn monthly_stats(&self, today: NaiveDate) -> LfResult<Vec<MonthlyBucket>> {
        ensure_running(self.name(), self.state)?;
        let since = month_start(today, MONTHLY_STATS_MONTHS - 1);
        let result = fetch_reports(self.backend(), &ReportKind::ALL, |q| {
            q.select("id,status,date,created_at")
                .gte("created_at", since.format("%Y-%m-%d"))
        })
        .await;

        match result {
            Ok(reports) => Ok(monthly_buckets(today, MONTHLY_STATS_MONTHS, &reports)),
            Err(e) => {
                warn!("monthly stats unavailable: {e}");
                Ok(empty_buckets(today, MONTHLY_STATS_MONTHS))
            }
        }
    }
}

impl Service for AdminService {
    fn name(&self) -> &str {
        "admin"
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
