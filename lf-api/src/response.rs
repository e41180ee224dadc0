//! Backend response helpers.
//!
//! PostgREST and the storage API report failures as a JSON body. This module
//! decodes that body and maps constraint violations onto domain errors.

use serde::{Deserialize, Serialize};

use lf_core::error::LfError;

/// PostgreSQL unique violation.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL foreign key violation.
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error body returned by PostgREST and the storage API.
///
/// ```json
/// { "code": "23505", "message": "duplicate key value violates unique constraint", "details": "...", "hint": null }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, falling back to the raw text as the message.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: (!body.trim().is_empty()).then(|| body.trim().to_string()),
            ..Self::default()
        })
    }

    /// Message plus details, for logs.
    pub fn describe(&self) -> String {
        let message = self.message.clone().unwrap_or_else(|| "unknown error".into());
        match &self.details {
            Some(details) if !details.is_empty() => format!("{message} ({details})"),
            _ => message,
        }
    }
}

/// Map a non-success status and body to an error.
pub fn classify_failure(status: u16, body: &str) -> LfError {
    let parsed = ErrorBody::parse(body);
    let code = parsed.code.as_deref().unwrap_or_default();
    let message = parsed.describe();

    if code == PG_FOREIGN_KEY_VIOLATION || message.contains("foreign key constraint") {
        return LfError::ForeignKey(message);
    }
    if code == PG_UNIQUE_VIOLATION || status == 409 || message.contains("duplicate key") {
        return LfError::DuplicateKey(message);
    }
    if status == 401 || status == 403 {
        return LfError::AuthFailed(format!("backend returned {status}: {message}"));
    }
    LfError::Backend { status, message }
}

/// Total row count from a `Content-Range` header (`0-24/3573`, `*/0`).
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_duplicate_key_classification() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"users_username_key\"","details":"Key (username)=(ana) already exists.","hint":null}"#;
        let err = classify_failure(409, body);
        assert!(matches!(err, LfError::DuplicateKey(_)));
        assert_eq!(
            err.user_message(),
            "A user with this NIM/NIP or username already exists."
        );
    }

    #[test]
    fn test_foreign_key_classification() {
        let body = r#"{"code":"23503","message":"update or delete on table \"users\" violates foreign key constraint","details":null,"hint":null}"#;
        assert!(matches!(classify_failure(409, body), LfError::ForeignKey(_)));
        assert_eq!(
            classify_failure(409, body).user_message(),
            "This user has associated records and cannot be deleted."
        );
    }

    #[test]
    fn test_plain_text_body() {
        match classify_failure(500, "upstream exploded") {
            LfError::Backend { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(classify_failure(401, ""), LfError::AuthFailed(_)));
    }
}
