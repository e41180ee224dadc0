//! Typed event bus for intra-service communication.
//!
//! Uses a tokio broadcast channel so services can announce state changes
//! without knowing who listens. The registry drains its own receiver after
//! each command and turns report events into owner notifications.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use lf_models::{ReportKind, ReportStatus, Role};

/// Application-level events.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// An account signed in and its session was stored.
    SignedIn { account_id: String, role: Role },
    /// The stored session was cleared.
    SignedOut { account_id: String },
    /// A user submitted a new report.
    ReportSubmitted {
        kind: ReportKind,
        report_id: String,
        owner_id: String,
        name: String,
    },
    /// A reviewer changed a report's status.
    ReportStatusChanged {
        kind: ReportKind,
        report_id: String,
        owner_id: String,
        name: String,
        from: ReportStatus,
        to: ReportStatus,
    },
    /// An admin created an account.
    AccountCreated { role: Role, username: String },
    /// An admin edited an account.
    AccountUpdated { role: Role, account_id: String },
    /// An admin deleted an account.
    AccountDeleted { role: Role, account_id: String },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Subscribers that fall behind receive
/// `Lagged` and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive application events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => {
                debug!("event_bus: emitted {label} to {count} subscriber(s)");
            }
            Err(_) => {
                debug!("event_bus: no subscribers for {label}");
            }
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Human-readable label for an event (for logging).
fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::SignedIn { .. } => "SignedIn",
        AppEvent::SignedOut { .. } => "SignedOut",
        AppEvent::ReportSubmitted { .. } => "ReportSubmitted",
        AppEvent::ReportStatusChanged { .. } => "ReportStatusChanged",
        AppEvent::AccountCreated { .. } => "AccountCreated",
        AppEvent::AccountUpdated { .. } => "AccountUpdated",
        AppEvent::AccountDeleted { .. } => "AccountDeleted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::SignedOut {
            account_id: "u1".into(),
        });

        match rx.recv().await.unwrap() {
            AppEvent::SignedOut { account_id } => assert_eq!(account_id, "u1"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(AppEvent::AccountCreated {
            role: Role::Security,
            username: "budi".into(),
        });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                AppEvent::AccountCreated { role, .. } => assert_eq!(role, Role::Security),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn test_no_subscribers_is_fine() {
        let bus = EventBus::new(4);
        bus.emit(AppEvent::AccountDeleted {
            role: Role::User,
            account_id: "u1".into(),
        });
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(
            event_label(&AppEvent::SignedIn {
                account_id: String::new(),
                role: Role::Admin
            }),
            "SignedIn"
        );
    }
}
