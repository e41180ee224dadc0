//! Sign-in against the hosted account tables and the local session.

use std::sync::Arc;

use tracing::{info, warn};

use lf_api::{Backend, Query};
use lf_core::error::{LfError, LfResult};
use lf_models::{Account, Database, Role, Session};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{ensure_running, Service, ServiceState};

/// Role-scoped authentication.
///
/// Credentials are compared against the role's table as stored. A successful
/// sign-in replaces any stored session.
pub struct AuthService {
    state: ServiceState,
    database: Database,
    backend: Arc<dyn Backend>,
    event_bus: EventBus,
}

impl AuthService {
    pub fn new(database: Database, backend: Arc<dyn Backend>, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            backend,
            event_bus,
        }
    }

    /// Sign in as `role`. Unknown usernames and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn sign_in(&self, username: &str, password: &str, role: Role) -> LfResult<Session> {
        ensure_running(self.name(), self.state)?;

        let query = Query::table(role.table())
            .eq("username", username.trim())
            .limit(1);
        let rows = self.backend.select(&query).await?;
        let account = Account::from_remote_rows(role, &rows)
            .into_iter()
            .next()
            .filter(|a| a.password_matches(password));

        let Some(account) = account else {
            warn!("failed {role} sign-in for {}", username.trim());
            return Err(LfError::InvalidCredentials(role.label().to_string()));
        };

        let session = Session::for_account(&account);
        self.database.transaction(|tx| session.save(tx))?;

        info!("{} signed in as {role}", session.username);
        self.event_bus.emit(AppEvent::SignedIn {
            account_id: session.account_id.clone(),
            role,
        });
        Ok(session)
    }

    /// Clear the stored session, returning it.
    pub fn sign_out(&self) -> LfResult<Option<Session>> {
        ensure_running(self.name(), self.state)?;
        let session = self.database.transaction(|tx| {
            let session = Session::load(tx)?;
            Session::clear(tx)?;
            Ok(session)
        })?;

        if let Some(s) = &session {
            info!("{} signed out", s.username);
            self.event_bus.emit(AppEvent::SignedOut {
                account_id: s.account_id.clone(),
            });
        }
        Ok(session)
    }

    pub fn current(&self) -> LfResult<Option<Session>> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        Session::load(&conn)
    }

    /// The stored session, if its role is one of `roles`.
    pub fn require(&self, roles: &[Role], area: &str) -> LfResult<Session> {
        let session = self.current()?.ok_or(LfError::NotSignedIn)?;
        if !roles.contains(&session.role) {
            return Err(LfError::Forbidden {
                role: session.role.to_string(),
                area: area.to_string(),
            });
        }
        Ok(session)
    }
}

impl Service for AuthService {
    fn name(&self) -> &str {
        "auth"
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
