//! Workspace error type.
//!
//! Every failure in the client funnels into `LfError`, with conversions from
//! the underlying library errors. `user_message` maps an error to the short,
//! generic text shown to an operator.

use thiserror::Error;

/// Convenience type alias for Results using LfError.
pub type LfResult<T> = Result<T, LfError>;

/// Unified error type for the lost & found client.
#[derive(Error, Debug)]
pub enum LfError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Local database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Hosted backend errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Backend returned an error response.
    #[error("backend error (status {status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Error message from the backend.
        message: String,
    },

    /// A unique constraint was violated (duplicate username or NIM/NIP).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A row is still referenced by another table.
    #[error("foreign key constraint: {0}")]
    ForeignKey(String),

    /// Object storage upload failed.
    #[error("storage error: {0}")]
    Storage(String),

    // -- Auth errors --
    /// The backend rejected the API key.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Username/password did not match an account of the requested role.
    #[error("invalid credentials for {0}")]
    InvalidCredentials(String),

    /// No session is stored locally.
    #[error("not signed in")]
    NotSignedIn,

    /// The current session's role may not use this dashboard.
    #[error("role {role} may not access {area}")]
    Forbidden {
        /// Role of the signed-in account.
        role: String,
        /// Dashboard or command that was refused.
        area: String,
    },

    // -- Domain errors --
    /// Form validation failed. Each entry is one field message.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A report, account or notification was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested status change is not allowed from the current status.
    #[error("cannot move report from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// The report is returned and can no longer be modified.
    #[error("report {0} is returned and cannot be modified")]
    ReportClosed(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    /// A service is not yet initialized.
    #[error("service not initialized: {0}")]
    ServiceNotInitialized(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for LfError {
    fn from(e: serde_json::Error) -> Self {
        LfError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for LfError {
    fn from(e: toml::de::Error) -> Self {
        LfError::Config(e.to_string())
    }
}

impl LfError {
    /// Short operator-facing message. Details stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            LfError::Validation(messages) => messages.join("\n"),
            LfError::InvalidCredentials(_) => {
                "Invalid username or password. Please try again.".to_string()
            }
            LfError::NotSignedIn => "You must be logged in to do that.".to_string(),
            LfError::Forbidden { area, .. } => {
                format!("Your account does not have access to the {area} dashboard.")
            }
            LfError::DuplicateKey(_) => {
                "A user with this NIM/NIP or username already exists.".to_string()
            }
            LfError::ForeignKey(_) => {
                "This user has associated records and cannot be deleted.".to_string()
            }
            LfError::ReportClosed(_) => {
                "Items marked as 'returned' cannot be modified.".to_string()
            }
            LfError::InvalidTransition { from, to } => {
                format!("A {from} item cannot be marked as {to}.")
            }
            LfError::NotFound(what) => format!("Not found: {what}"),
            LfError::MissingConfig(what) => format!("Missing configuration: {what}"),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LfError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_validation_display_joins_messages() {
        let err = LfError::Validation(vec![
            "Title must be at least 3 characters.".into(),
            "Please select a category.".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: Title must be at least 3 characters.; Please select a category."
        );
        assert_eq!(
            err.user_message(),
            "Title must be at least 3 characters.\nPlease select a category."
        );
    }

    #[test]
    fn test_generic_user_message() {
        let err = LfError::Backend {
            status: 500,
            message: "relation does not exist".into(),
        };
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }

    #[test]
    fn test_closed_report_message() {
        let err = LfError::ReportClosed("abc".into());
        assert_eq!(
            err.user_message(),
            "Items marked as 'returned' cannot be modified."
        );
    }
}
