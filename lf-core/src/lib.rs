//! Lost & Found Core - foundation types shared by every crate in the workspace.
//!
//! This crate provides:
//! - Application configuration (hosted backend, storage bucket, local database)
//! - The workspace-wide error type
//! - Structured logging with tracing
//! - Platform directories and common constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{LfError, LfResult};
pub use logging::init_logging;
pub use platform::Platform;
