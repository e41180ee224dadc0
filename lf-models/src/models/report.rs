//! Lost and found report models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use lf_core::constants::tables;
use lf_core::error::{LfError, LfResult};

use super::status::ReportStatus;
use super::{parse_date, parse_timestamp, str_field};

/// Whether a report describes a lost item or a found item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Lost,
    Found,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::Lost, ReportKind::Found];

    /// Remote table holding reports of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            ReportKind::Lost => tables::LOST_ITEMS,
            ReportKind::Found => tables::FOUND_ITEMS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Lost => "lost",
            ReportKind::Found => "found",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Lost => "Lost",
            ReportKind::Found => "Found",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = LfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lost" => Ok(ReportKind::Lost),
            "found" => Ok(ReportKind::Found),
            _ => Err(LfError::Validation(vec![
                "Please select whether the item was lost or found.".to_string(),
            ])),
        }
    }
}

/// A lost or found item report as stored in the hosted tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub kind: ReportKind,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    /// Day the item was lost or found.
    pub date: NaiveDate,
    pub status: ReportStatus,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Transient: name of the reporting user, resolved separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
}

impl Report {
    /// Decode a row returned by the backend for the given table kind.
    ///
    /// An embedded `users(name)` relation, when selected, fills
    /// `reporter_name`.
    pub fn from_remote(kind: ReportKind, row: &Value) -> LfResult<Self> {
        let id = str_field(row, "id")
            .ok_or_else(|| LfError::Serialization("report missing id".into()))?;

        let status = match row.get("status").and_then(|v| v.as_str()) {
            Some(raw) => raw.parse()?,
            None => ReportStatus::Reported,
        };

        let date = row
            .get("date")
            .and_then(|v| v.as_str())
            .and_then(parse_date)
            .ok_or_else(|| LfError::Serialization(format!("report {id} has no valid date")))?;

        let created_at = row
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                LfError::Serialization(format!("report {id} has no valid created_at"))
            })?;

        let reporter_name = row
            .get("users")
            .and_then(|u| u.get("name"))
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(Self {
            id,
            kind,
            user_id: str_field(row, "user_id").unwrap_or_default(),
            name: str_field(row, "name").unwrap_or_default(),
            category: str_field(row, "category").unwrap_or_default(),
            description: str_field(row, "description").unwrap_or_default(),
            location: str_field(row, "location").unwrap_or_default(),
            date,
            status,
            image_url: str_field(row, "image_url").filter(|s| !s.is_empty()),
            created_at,
            reporter_name,
        })
    }

    /// Decode a list of rows, skipping and logging malformed ones.
    pub fn from_remote_rows(kind: ReportKind, rows: &[Value]) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| match Self::from_remote(kind, row) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!("skipping malformed {kind} report: {e}");
                    None
                }
            })
            .collect()
    }

    /// Reporter name or a placeholder when it could not be resolved.
    pub fn reporter_display(&self) -> &str {
        self.reporter_name.as_deref().unwrap_or("Unknown")
    }

    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }
}

/// Payload for inserting a new report.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub kind: ReportKind,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub image_url: Option<String>,
}

impl NewReport {
    /// Insert body for the kind's table. New reports always start `reported`.
    pub fn to_insert_json(&self) -> Value {
        json!({
            "user_id": self.user_id,
            "name": self.name,
            "category": self.category,
            "description": self.description,
            "location": self.location,
            "date": self.date.format("%Y-%m-%d").to_string(),
            "status": ReportStatus::Reported.as_str(),
            "image_url": self.image_url,
        })
    }
}

/// Sort reports newest first by creation time.
pub fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
