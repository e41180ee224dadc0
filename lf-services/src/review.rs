//! Security review: status transitions and the security dashboard.
//!
//! A transition writes the new status, then appends an activity-log entry.
//! The two writes are independent. A failed log write is reported in the
//! outcome and never undoes the status change. Concurrent reviewers race
//! with last-writer-wins semantics.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use lf_api::{Backend, Query};
use lf_core::error::{LfError, LfResult};
use lf_models::{ActivityLog, Actor, Report, ReportKind, ReportStatus};

use crate::activity::{fetch_logs, record};
use crate::event_bus::{AppEvent, EventBus};
use crate::reports::{attach_reporters, fetch_reports};
use crate::service::{ensure_running, Service, ServiceState};
use crate::stats::ReportSummary;

/// Result of a status change.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    /// The report as stored after the change.
    pub report: Report,
    pub previous: ReportStatus,
    /// Whether the activity-log entry was written.
    pub log_written: bool,
}

/// Activity-log text for a move into `target`.
pub fn transition_action(
    kind: ReportKind,
    name: &str,
    target: ReportStatus,
    notes: Option<&str>,
) -> String {
    let mut action = format!("{} item \"{name}\" {}", kind.label(), target.log_phrase());
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        action.push_str(": ");
        action.push_str(notes);
    }
    action
}

/// Report review for security staff and admins.
pub struct ReviewService {
    state: ServiceState,
    backend: Arc<dyn Backend>,
    event_bus: EventBus,
}

impl ReviewService {
    pub fn new(backend: Arc<dyn Backend>, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
            event_bus,
        }
    }

    async fn find(&self, kind: ReportKind, id: &str) -> LfResult<Report> {
        let query = Query::table(kind.table()).eq("id", id).limit(1);
        let rows = self.backend.select(&query).await?;
        rows.first()
            .map(|row| Report::from_remote(kind, row))
            .transpose()?
            .ok_or_else(|| LfError::NotFound(format!("{kind} report {id}")))
    }

    /// Move a report to `target` on behalf of `actor`.
    pub async fn transition(
        &self,
        kind: ReportKind,
        id: &str,
        target: ReportStatus,
        notes: Option<&str>,
        actor: &Actor,
    ) -> LfResult<TransitionOutcome> {
        ensure_running(self.name(), self.state)?;

        let current = self.find(kind, id).await?;
        if !current.is_editable() {
            return Err(LfError::ReportClosed(id.to_string()));
        }
        if !current.status.can_transition_to(target) {
            return Err(LfError::InvalidTransition {
                from: current.status.to_string(),
                to: target.to_string(),
            });
        }

        let query = Query::table(kind.table()).eq("id", id);
        let rows = self
            .backend
            .update(&query, &json!({ "status": target.as_str() }))
            .await?;
        let report = match rows.first() {
            Some(row) => Report::from_remote(kind, row)?,
            None => return Err(LfError::NotFound(format!("{kind} report {id}"))),
        };
        info!(
            "{kind} report {id} moved from {} to {target} by {}",
            current.status,
            actor.id()
        );

        let action = transition_action(kind, &report.name, target, notes);
        let log_written = record(self.backend.as_ref(), actor, &action).await;
        if !log_written {
            warn!("status of {kind} report {id} changed without an activity entry");
        }

        self.event_bus.emit(AppEvent::ReportStatusChanged {
            kind,
            report_id: report.id.clone(),
            owner_id: report.user_id.clone(),
            name: report.name.clone(),
            from: current.status,
            to: target,
        });

        Ok(TransitionOutcome {
            report,
            previous: current.status,
            log_written,
        })
    }

    /// Admin quick action: mark a report returned to its owner.
    pub async fn mark_returned(
        &self,
        kind: ReportKind,
        id: &str,
        admin_id: &str,
    ) -> LfResult<TransitionOutcome> {
        self.transition(
            kind,
            id,
            ReportStatus::Returned,
            None,
            &Actor::Admin(admin_id.to_string()),
        )
        .await
    }

    /// Every `reported` item from both tables, newest first, with reporters.
    pub async fn pending_reports(&self) -> LfResult<Vec<Report>> {
        ensure_running(self.name(), self.state)?;
        let mut reports = fetch_reports(self.backend.as_ref(), &ReportKind::ALL, |q| {
            q.eq("status", ReportStatus::Reported.as_str())
        })
        .await?;
        attach_reporters(self.backend.as_ref(), &mut reports).await;
        Ok(reports)
    }

    /// Totals per kind and status across both tables.
    pub async fn security_stats(&self) -> LfResult<ReportSummary> {
        ensure_running(self.name(), self.state)?;
        let reports = fetch_reports(self.backend.as_ref(), &ReportKind::ALL, |q| {
            q.select("id,status,date,created_at")
        })
        .await?;
        Ok(ReportSummary::from_reports(&reports))
    }

    pub async fn recent_activity(&self, limit: usize) -> LfResult<Vec<ActivityLog>> {
        ensure_running(self.name(), self.state)?;
        fetch_logs(self.backend.as_ref(), Some(limit)).await
    }
}

impl Service for ReviewService {
    fn name(&self) -> &str {
        "review"
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
