//! Report search across both tables.
//!
//! Filters are pushed down to the backend; results from the lost and found
//! tables are merged client-side, newest first.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use lf_api::{Backend, Query};
use lf_core::constants::DEFAULT_CATEGORIES;
use lf_core::error::LfResult;
use lf_models::{Report, ReportKind, ReportStatus};

use crate::reports::{attach_reporters, fetch_reports, kinds};
use crate::service::{ensure_running, Service, ServiceState};

/// Search filters. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// Case-insensitive substring over name, description and location.
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub status: Option<ReportStatus>,
    /// Inclusive lower bound on the item date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the item date.
    pub date_to: Option<NaiveDate>,
    /// Restrict to one table.
    pub kind: Option<ReportKind>,
}

impl SearchParams {
    fn apply(&self, mut query: Query) -> Query {
        if let Some(keyword) = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            query = query.ilike_any(&["name", "description", "location"], keyword);
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            query = query.eq("category", category);
        }
        if let Some(status) = self.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(from) = self.date_from {
            query = query.gte("date", from.format("%Y-%m-%d"));
        }
        if let Some(to) = self.date_to {
            query = query.lte("date", to.format("%Y-%m-%d"));
        }
        query
    }
}

/// Default categories as owned strings.
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// In-memory filter used by the admin report table. `query` matches name,
/// description, location, category and reporter name.
pub fn filter_reports(
    reports: &[Report],
    query: &str,
    kind: Option<ReportKind>,
    status: Option<ReportStatus>,
) -> Vec<Report> {
    let q = query.trim().to_lowercase();
    reports
        .iter()
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .filter(|r| status.map_or(true, |s| r.status == s))
        .filter(|r| {
            q.is_empty()
                || [
                    r.name.as_str(),
                    r.description.as_str(),
                    r.location.as_str(),
                    r.category.as_str(),
                    r.reporter_display(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

/// Search over lost and found reports.
pub struct SearchService {
    state: ServiceState,
    backend: Arc<dyn Backend>,
}

impl SearchService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
        }
    }

    /// Reports matching `params`, newest first, with reporter names.
    pub async fn search(&self, params: &SearchParams) -> LfResult<Vec<Report>> {
        ensure_running(self.name(), self.state)?;
        let mut reports =
            fetch_reports(self.backend.as_ref(), &kinds(params.kind), |q| params.apply(q)).await?;
        attach_reporters(self.backend.as_ref(), &mut reports).await;
        debug!("search matched {} reports", reports.len());
        Ok(reports)
    }

    /// Distinct categories across both tables, sorted. Falls back to the
    /// defaults when the tables cannot be read or hold no categories.
    pub async fn categories(&self) -> LfResult<Vec<String>> {
        ensure_running(self.name(), self.state)?;
        let mut found = BTreeSet::new();
        for kind in ReportKind::ALL {
            let query = Query::table(kind.table()).select("category");
            match self.backend.select(&query).await {
                Ok(rows) => found.extend(
                    rows.iter()
                        .filter_map(|r| r.get("category").and_then(Value::as_str))
                        .filter(|c| !c.trim().is_empty())
                        .map(String::from),
                ),
                Err(e) => {
                    warn!("could not load categories, using defaults: {e}");
                    return Ok(default_categories());
                }
            }
        }
        if found.is_empty() {
            return Ok(default_categories());
        }
        Ok(found.into_iter().collect())
    }
}

impl Service for SearchService {
    fn name(&self) -> &str {
        "search"
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
