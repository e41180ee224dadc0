//! Endpoint groups of the hosted backend.
//!
//! Each module adds typed methods to [`ApiClient`]; this module wires them
//! into the [`Backend`] trait.

pub mod rest;
pub mod storage;

use async_trait::async_trait;
use serde_json::Value;

use lf_core::error::LfResult;

use crate::backend::{Backend, UploadOptions};
use crate::client::ApiClient;
use crate::query::Query;

#[async_trait]
impl Backend for ApiClient {
    async fn select(&self, query: &Query) -> LfResult<Vec<Value>> {
        self.select_rows(query).await
    }

    async fn count(&self, query: &Query) -> LfResult<u64> {
        self.count_rows(query).await
    }

    async fn insert(&self, table: &str, row: &Value) -> LfResult<Value> {
        self.insert_row(table, row).await
    }

    async fn update(&self, query: &Query, patch: &Value) -> LfResult<Vec<Value>> {
        self.update_rows(query, patch).await
    }

    async fn delete(&self, query: &Query) -> LfResult<u64> {
        self.delete_rows(query).await
    }

    async fn rpc(&self, function: &str, args: &Value) -> LfResult<Value> {
        self.call_rpc(function, args).await
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> LfResult<String> {
        self.upload(bucket, path, bytes, options).await
    }
}
