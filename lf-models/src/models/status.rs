//! Report status lifecycle.
//!
//! `reported -> verified -> matched -> returned`, where any later state may
//! be reached directly and `returned` is terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lf_core::error::LfError;

/// Status of a lost or found report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Reported,
    Verified,
    Matched,
    Returned,
}

impl ReportStatus {
    /// Every status in lifecycle order.
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Reported,
        ReportStatus::Verified,
        ReportStatus::Matched,
        ReportStatus::Returned,
    ];

    /// Wire value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Reported => "reported",
            ReportStatus::Verified => "verified",
            ReportStatus::Matched => "matched",
            ReportStatus::Returned => "returned",
        }
    }

    /// Capitalized label for tables and badges.
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Reported => "Reported",
            ReportStatus::Verified => "Verified",
            ReportStatus::Matched => "Matched",
            ReportStatus::Returned => "Returned",
        }
    }

    /// Statuses a report in this status may move to.
    pub fn allowed_next(&self) -> &'static [ReportStatus] {
        match self {
            ReportStatus::Reported => &[
                ReportStatus::Verified,
                ReportStatus::Matched,
                ReportStatus::Returned,
            ],
            ReportStatus::Verified => &[ReportStatus::Matched, ReportStatus::Returned],
            ReportStatus::Matched => &[ReportStatus::Returned],
            ReportStatus::Returned => &[],
        }
    }

    pub fn can_transition_to(&self, target: ReportStatus) -> bool {
        self.allowed_next().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Returned)
    }

    /// Whether a reviewer may still change this report.
    pub fn is_editable(&self) -> bool {
        !self.is_terminal()
    }

    /// Verb phrase used in activity log entries for a move into this status.
    pub fn log_phrase(&self) -> &'static str {
        match self {
            ReportStatus::Reported => "marked as reported",
            ReportStatus::Verified => "verified",
            ReportStatus::Matched => "marked as matched",
            ReportStatus::Returned => "marked as returned to owner",
        }
    }
}

impl Default for ReportStatus {
    fn default() -> Self {
        ReportStatus::Reported
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = LfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reported" => Ok(ReportStatus::Reported),
            "verified" => Ok(ReportStatus::Verified),
            "matched" => Ok(ReportStatus::Matched),
            "returned" => Ok(ReportStatus::Returned),
            other => Err(LfError::Validation(vec![format!(
                "Unknown status '{other}'. Expected reported, verified, matched or returned."
            )])),
        }
    }
}
