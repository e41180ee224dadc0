//! Service registry for dependency injection and lifecycle management.
//!
//! The registry owns the shared infrastructure (config, local database,
//! backend, event bus), builds every service from it, initializes them in
//! order and shuts them down in reverse. It also holds the bus receiver that
//! turns report events into owner notifications.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{error, info, warn};

use lf_api::Backend;
use lf_core::config::{AppConfig, ConfigHandle};
use lf_core::error::{LfError, LfResult};
use lf_models::Database;

use crate::activity::ActivityService;
use crate::admin::AdminService;
use crate::auth::AuthService;
use crate::event_bus::{AppEvent, EventBus};
use crate::notifications::NotificationService;
use crate::reports::ReportService;
use crate::review::ReviewService;
use crate::search::SearchService;
use crate::service::{Service, ServiceState};

/// Central registry holding every application service.
pub struct ServiceRegistry {
    /// Application configuration.
    pub config: ConfigHandle,
    /// Local database (session and notifications).
    pub database: Database,
    /// Hosted backend.
    pub backend: Arc<dyn Backend>,
    /// Application-level event bus.
    pub event_bus: EventBus,
    events: broadcast::Receiver<AppEvent>,

    pub auth: AuthService,
    pub notifications: NotificationService,
    pub activity: ActivityService,
    pub reports: ReportService,
    pub review: ReviewService,
    pub search: SearchService,
    pub admin: AdminService,
}

impl ServiceRegistry {
    /// Build all services over the shared infrastructure.
    pub fn new(config: AppConfig, database: Database, backend: Arc<dyn Backend>) -> Self {
        let event_bus = EventBus::new(256);
        let events = event_bus.subscribe();
        let storage = config.storage.clone();

        Self {
            auth: AuthService::new(database.clone(), backend.clone(), event_bus.clone()),
            notifications: NotificationService::new(database.clone()),
            activity: ActivityService::new(backend.clone()),
            reports: ReportService::new(backend.clone(), event_bus.clone(), storage),
            review: ReviewService::new(backend.clone(), event_bus.clone()),
            search: SearchService::new(backend.clone()),
            admin: AdminService::new(backend.clone(), event_bus.clone()),
            config: ConfigHandle::new(config),
            database,
            backend,
            event_bus,
            events,
        }
    }

    /// Services in initialization order.
    fn services_mut(&mut self) -> Vec<&mut dyn Service> {
        let services: [&mut dyn Service; 7] = [
            &mut self.auth,
            &mut self.notifications,
            &mut self.activity,
            &mut self.reports,
            &mut self.review,
            &mut self.search,
            &mut self.admin,
        ];
        Vec::from(services)
    }

    fn services(&self) -> Vec<&dyn Service> {
        let services: [&dyn Service; 7] = [
            &self.auth,
            &self.notifications,
            &self.activity,
            &self.reports,
            &self.review,
            &self.search,
            &self.admin,
        ];
        Vec::from(services)
    }

    /// Initialize all services in order.
    pub fn init_all(&mut self) -> LfResult<()> {
        for svc in self.services_mut() {
            let name = svc.name().to_string();
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(LfError::ServiceInit(format!("{name}: {e}")));
            }
        }
        info!("all services initialized");
        Ok(())
    }

    /// Shut down all services in reverse order.
    pub fn shutdown_all(&mut self) -> LfResult<()> {
        for svc in self.services_mut().into_iter().rev() {
            let name = svc.name().to_string();
            if let Err(e) = svc.shutdown() {
                // Continue shutting down other services
                error!("error shutting down service {name}: {e}");
            }
        }
        info!("all services shut down");
        Ok(())
    }

    /// Drain pending bus events into owner notifications. Returns the
    /// number of notifications stored.
    pub fn dispatch_events(&mut self) -> usize {
        let mut stored = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => match self.notifications.handle_event(&event) {
                    Ok(Some(_)) => stored += 1,
                    Ok(None) => {}
                    Err(e) => warn!("could not store notification: {e}"),
                },
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("notification dispatch missed {missed} events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        stored
    }

    /// Name, state and health of every service.
    pub fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        self.services()
            .into_iter()
            .map(|svc| (svc.name().to_string(), svc.state(), svc.is_healthy()))
            .collect()
    }

    pub fn service_count(&self) -> usize {
        self.services().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_api::MemoryBackend;
    use lf_core::config::DatabaseConfig;
    use lf_models::ReportKind;

    fn registry() -> (ServiceRegistry, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("test.db"), &DatabaseConfig::default()).unwrap();
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        (ServiceRegistry::new(AppConfig::default(), db, backend), dir)
    }

    #[test]
    fn test_lifecycle() {
        let (mut reg, _dir) = registry();
        assert_eq!(reg.service_count(), 7);
        assert!(reg.health_check().iter().all(|(_, _, healthy)| !healthy));

        reg.init_all().unwrap();
        assert!(reg
            .health_check()
            .iter()
            .all(|(_, state, healthy)| *state == ServiceState::Running && *healthy));

        reg.shutdown_all().unwrap();
        assert!(reg
            .health_check()
            .iter()
            .all(|(_, state, _)| *state == ServiceState::Stopped));
    }

    #[test]
    fn test_dispatch_turns_events_into_notifications() {
        let (mut reg, _dir) = registry();
        reg.init_all().unwrap();

        reg.event_bus.emit(AppEvent::ReportSubmitted {
            kind: ReportKind::Lost,
            report_id: "l1".into(),
            owner_id: "u1".into(),
            name: "Wallet".into(),
        });
        reg.event_bus.emit(AppEvent::SignedOut {
            account_id: "u1".into(),
        });

        assert_eq!(reg.dispatch_events(), 1);
        assert_eq!(reg.dispatch_events(), 0);
        assert_eq!(reg.notifications.unread_count("u1").unwrap(), 1);
    }
}
