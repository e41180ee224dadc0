//! Report submission and per-user listing.
//!
//! A submission validates the form, uploads the first image (if any) to
//! object storage, and inserts the report with status `reported`. An upload
//! failure does not block the submission.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use lf_api::{Backend, Query, UploadOptions};
use lf_core::config::StorageConfig;
use lf_core::constants::tables;
use lf_core::error::{LfError, LfResult};
use lf_models::models::report::sort_newest_first;
use lf_models::{ImageUpload, Report, ReportForm, ReportKind};

use crate::activity::load_directory;
use crate::event_bus::{AppEvent, EventBus};
use crate::service::{ensure_running, Service, ServiceState};
use crate::stats::ReportSummary;

/// Select rows from each kind's table with the same filters, merged and
/// sorted newest first.
pub(crate) async fn fetch_reports<F>(
    backend: &dyn Backend,
    kinds: &[ReportKind],
    build: F,
) -> LfResult<Vec<Report>>
where
    F: Fn(Query) -> Query,
{
    let mut reports = Vec::new();
    for kind in kinds {
        let query = build(Query::table(kind.table()).order_desc("created_at"));
        let rows = backend.select(&query).await?;
        reports.extend(Report::from_remote_rows(*kind, &rows));
    }
    sort_newest_first(&mut reports);
    Ok(reports)
}

/// Fill `reporter_name` from the users table.
pub(crate) async fn attach_reporters(backend: &dyn Backend, reports: &mut [Report]) {
    if reports.is_empty() {
        return;
    }
    let directory = load_directory(backend).await;
    for report in reports {
        report.reporter_name = directory.user_name(&report.user_id).map(String::from);
    }
}

/// `None` means both kinds.
pub(crate) fn kinds(kind: Option<ReportKind>) -> Vec<ReportKind> {
    kind.map_or_else(|| ReportKind::ALL.to_vec(), |k| vec![k])
}

/// Result of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub report: Report,
    /// False when an image was attached but could not be stored.
    pub image_uploaded: bool,
}

/// Report submission and the user dashboard's listings.
pub struct ReportService {
    state: ServiceState,
    backend: Arc<dyn Backend>,
    event_bus: EventBus,
    storage: StorageConfig,
}

impl ReportService {
    pub fn new(backend: Arc<dyn Backend>, event_bus: EventBus, storage: StorageConfig) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
            event_bus,
            storage,
        }
    }

    /// Object path for an upload: `{user_id}_{unix_millis}.{ext}`.
    pub fn object_path(user_id: &str, image: &ImageUpload) -> String {
        format!(
            "{user_id}_{}.{}",
            Utc::now().timestamp_millis(),
            image.extension()
        )
    }

    async fn upload_image(&self, user_id: &str, image: &ImageUpload) -> LfResult<String> {
        let path = Self::object_path(user_id, image);
        let options = UploadOptions {
            content_type: image.content_type.clone(),
            cache_control_secs: self.storage.cache_control_secs,
            upsert: true,
        };
        self.backend
            .upload_object(&self.storage.bucket, &path, image.bytes.clone(), &options)
            .await
    }

    /// Validate and store a new report owned by `user_id`.
    pub async fn submit(&self, form: &ReportForm, user_id: &str) -> LfResult<SubmitOutcome> {
        ensure_running(self.name(), self.state)?;
        form.validate(&self.storage)?;

        let mut image_uploaded = true;
        let mut image_url = None;
        if let Some(image) = form.images.first() {
            match self.upload_image(user_id, image).await {
                Ok(url) => image_url = Some(url),
                Err(e) => {
                    warn!("image upload failed, submitting without image: {e}");
                    image_uploaded = false;
                }
            }
        }

        let new = form.to_new_report(user_id, image_url)?;
        let row = self
            .backend
            .insert(form.kind.table(), &new.to_insert_json())
            .await?;
        let report = Report::from_remote(form.kind, &row)?;

        info!("{} report {} submitted by {user_id}", report.kind, report.id);
        self.event_bus.emit(AppEvent::ReportSubmitted {
            kind: report.kind,
            report_id: report.id.clone(),
            owner_id: user_id.to_string(),
            name: report.name.clone(),
        });

        Ok(SubmitOutcome {
            report,
            image_uploaded,
        })
    }

    /// The user's own reports of one kind, or both merged.
    pub async fn user_reports(
        &self,
        user_id: &str,
        kind: Option<ReportKind>,
    ) -> LfResult<Vec<Report>> {
        ensure_running(self.name(), self.state)?;
        fetch_reports(self.backend.as_ref(), &kinds(kind), |q| q.eq("user_id", user_id)).await
    }

    /// A single report with its reporter's name.
    pub async fn get(&self, kind: ReportKind, id: &str) -> LfResult<Report> {
        ensure_running(self.name(), self.state)?;
        let query = Query::table(kind.table()).eq("id", id).limit(1);
        let rows = self.backend.select(&query).await?;
        let mut report = rows
            .first()
            .map(|row| Report::from_remote(kind, row))
            .transpose()?
            .ok_or_else(|| LfError::NotFound(format!("{kind} report {id}")))?;

        let users = Query::table(tables::USERS)
            .select("id,name")
            .eq("id", &report.user_id)
            .limit(1);
        match self.backend.select(&users).await {
            Ok(rows) => {
                report.reporter_name = rows
                    .first()
                    .and_then(|r| r.get("name"))
                    .and_then(|v| v.as_str())
                    .map(String::from);
            }
            Err(e) => warn!("could not resolve reporter of {id}: {e}"),
        }
        Ok(report)
    }

    /// Counts of the user's reports by kind and status.
    pub async fn user_summary(&self, user_id: &str) -> LfResult<ReportSummary> {
        let reports = self.user_reports(user_id, None).await?;
        Ok(ReportSummary::from_reports(&reports))
    }
}

impl Service for ReportService {
    fn name(&self) -> &str {
        "reports"
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
