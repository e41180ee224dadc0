//! Lost & Found API - client for the hosted backend.
//!
//! The backend exposes its tables through a PostgREST interface, stored
//! procedures under `/rest/v1/rpc`, and an object store for item images.
//! [`Backend`] is the generic surface the service layer talks to;
//! [`ApiClient`] implements it over HTTP and [`MemoryBackend`] implements it
//! in memory for tests and offline use.

pub mod backend;
pub mod client;
pub mod endpoints;
pub mod memory;
pub mod query;
pub mod response;

// Re-export key types
pub use backend::{Backend, UploadOptions};
pub use client::{ApiClient, RetryConfig};
pub use memory::MemoryBackend;
pub use query::{Filter, Order, Query};
pub use response::{parse_content_range, ErrorBody};
