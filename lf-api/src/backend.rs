//! The generic backend surface used by the service layer.

use async_trait::async_trait;
use serde_json::Value;

use lf_core::error::LfResult;

use crate::query::Query;

/// Options for an object upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub content_type: String,
    /// `Cache-Control: max-age` in seconds.
    pub cache_control_secs: u64,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
}

/// Row-level access to the hosted tables plus object storage.
///
/// Rows are plain JSON objects keyed by column name. Writes are sent once;
/// only reads may be retried by an implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows matching the query.
    async fn select(&self, query: &Query) -> LfResult<Vec<Value>>;

    /// Exact number of rows matching the query's filters.
    async fn count(&self, query: &Query) -> LfResult<u64>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: &Value) -> LfResult<Value>;

    /// Apply `patch` to every row matching the query's filters and return
    /// the updated rows.
    async fn update(&self, query: &Query, patch: &Value) -> LfResult<Vec<Value>>;

    /// Delete every row matching the query's filters. Returns the number removed.
    async fn delete(&self, query: &Query) -> LfResult<u64>;

    /// Call a stored procedure with named arguments.
    async fn rpc(&self, function: &str, args: &Value) -> LfResult<Value>;

    /// Store an object and return its public URL.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> LfResult<String>;
}
