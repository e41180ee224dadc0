//! Local notification service.
//!
//! Notifications live only in the local database, scoped per user. Report
//! events from the bus are turned into notifications for the report owner.

use tracing::{debug, info};

use lf_core::error::{LfError, LfResult};
use lf_models::{Database, NewNotification, Notification, NotificationKind, ReportStatus};

use crate::event_bus::AppEvent;
use crate::service::{ensure_running, Service, ServiceState};

/// Owner-facing notification for a report event, if the event warrants one.
pub fn notification_for_event(event: &AppEvent) -> Option<(String, NewNotification)> {
    match event {
        AppEvent::ReportSubmitted {
            kind,
            report_id,
            owner_id,
            name,
        } => Some((
            owner_id.clone(),
            NewNotification {
                message: format!("Your {kind} item '{name}' has been reported successfully."),
                kind: NotificationKind::Report,
                item_id: Some(report_id.clone()),
            },
        )),
        AppEvent::ReportStatusChanged {
            kind,
            report_id,
            owner_id,
            name,
            to,
            ..
        } => {
            let (outcome, notification_kind) = match to {
                ReportStatus::Verified => (
                    "has been verified by security",
                    NotificationKind::Verification,
                ),
                ReportStatus::Matched => (
                    "has been matched with a corresponding item",
                    NotificationKind::Match,
                ),
                ReportStatus::Returned => ("has been marked as returned", NotificationKind::Return),
                ReportStatus::Reported => return None,
            };
            Some((
                owner_id.clone(),
                NewNotification {
                    message: format!("Your {kind} item '{name}' {outcome}."),
                    kind: notification_kind,
                    item_id: Some(report_id.clone()),
                },
            ))
        }
        _ => None,
    }
}

/// Per-user notification list backed by the local database.
pub struct NotificationService {
    state: ServiceState,
    database: Database,
}

impl NotificationService {
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    /// All notifications for `user_id`, newest first.
    pub fn list(&self, user_id: &str) -> LfResult<Vec<Notification>> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        Notification::list_for_user(&conn, user_id)
    }

    pub fn add(&self, user_id: &str, new: NewNotification) -> LfResult<Notification> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        let notification = Notification::insert(&conn, user_id, new)?;
        debug!("notification {} added for {user_id}", notification.id);
        Ok(notification)
    }

    pub fn mark_read(&self, user_id: &str, id: &str) -> LfResult<()> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        if !Notification::mark_read(&conn, user_id, id)? {
            return Err(LfError::NotFound(format!("notification {id}")));
        }
        Ok(())
    }

    pub fn mark_all_read(&self, user_id: &str) -> LfResult<usize> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        Notification::mark_all_read(&conn, user_id)
    }

    pub fn delete(&self, user_id: &str, id: &str) -> LfResult<()> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        if !Notification::delete(&conn, user_id, id)? {
            return Err(LfError::NotFound(format!("notification {id}")));
        }
        Ok(())
    }

    /// Remove every notification for `user_id`.
    pub fn clear(&self, user_id: &str) -> LfResult<usize> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        let removed = Notification::clear(&conn, user_id)?;
        info!("cleared {removed} notifications for {user_id}");
        Ok(removed)
    }

    pub fn unread_count(&self, user_id: &str) -> LfResult<i64> {
        ensure_running(self.name(), self.state)?;
        let conn = self.database.conn()?;
        Notification::unread_count(&conn, user_id)
    }

    /// Store the owner notification for a bus event, if any.
    pub fn handle_event(&self, event: &AppEvent) -> LfResult<Option<Notification>> {
        match notification_for_event(event) {
            Some((owner_id, new)) => self.add(&owner_id, new).map(Some),
            None => Ok(None),
        }
    }
}

impl Service for NotificationService {
    fn name(&self) -> &str {
        "notifications"
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
