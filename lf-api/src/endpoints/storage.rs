//! Object storage endpoints (`/storage/v1`).

use tracing::info;

use lf_core::error::{LfError, LfResult};

use crate::backend::UploadOptions;
use crate::client::ApiClient;

impl ApiClient {
    /// Upload an object and return its public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> LfResult<String> {
        let size = bytes.len();
        let url = self.object_url(bucket, path);
        let headers = [
            ("content-type", options.content_type.clone()),
            ("cache-control", format!("max-age={}", options.cache_control_secs)),
            ("x-upsert", options.upsert.to_string()),
        ];

        self.post_bytes(&url, bytes, &headers)
            .await
            .map_err(|e| LfError::Storage(format!("upload of {path} failed: {e}")))?;

        info!("uploaded {path} ({} KB) to {bucket}", size / 1024);
        Ok(self.public_object_url(bucket, path))
    }
}
