//! Table and RPC endpoints (`/rest/v1`).

use reqwest::Method;
use serde_json::Value;

use lf_core::error::{LfError, LfResult};

use crate::client::ApiClient;
use crate::query::Query;
use crate::response::parse_content_range;

/// Ask PostgREST to echo written rows back.
const RETURN_REPRESENTATION: &str = "return=representation";

fn into_rows(value: Value) -> LfResult<Vec<Value>> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other @ Value::Object(_) => Ok(vec![other]),
        other => Err(LfError::Serialization(format!(
            "expected rows, got {other}"
        ))),
    }
}

impl ApiClient {
    /// GET rows matching a query.
    pub async fn select_rows(&self, query: &Query) -> LfResult<Vec<Value>> {
        let url = self.rest_url(&query.table);
        let resp = self
            .request(Method::GET, &url, &query.to_params(), None, None)
            .await?;
        into_rows(Self::json_body(resp).await?)
    }

    /// Exact count via `HEAD` with `Prefer: count=exact`.
    pub async fn count_rows(&self, query: &Query) -> LfResult<u64> {
        let url = self.rest_url(&query.table);
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.filter_params());

        let resp = self
            .request(Method::HEAD, &url, &params, None, Some("count=exact"))
            .await?;
        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| LfError::Http("count response missing Content-Range".into()))?;
        parse_content_range(range)
            .ok_or_else(|| LfError::Http(format!("unparseable Content-Range: {range}")))
    }

    /// POST one row and return the stored representation.
    pub async fn insert_row(&self, table: &str, row: &Value) -> LfResult<Value> {
        let url = self.rest_url(table);
        let resp = self
            .request(Method::POST, &url, &[], Some(row), Some(RETURN_REPRESENTATION))
            .await?;
        into_rows(Self::json_body(resp).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| LfError::Backend {
                status: 200,
                message: format!("insert into {table} returned no row"),
            })
    }

    /// PATCH rows matching the query's filters.
    pub async fn update_rows(&self, query: &Query, patch: &Value) -> LfResult<Vec<Value>> {
        let url = self.rest_url(&query.table);
        let resp = self
            .request(
                Method::PATCH,
                &url,
                &query.filter_params(),
                Some(patch),
                Some(RETURN_REPRESENTATION),
            )
            .await?;
        into_rows(Self::json_body(resp).await?)
    }

    /// DELETE rows matching the query's filters.
    pub async fn delete_rows(&self, query: &Query) -> LfResult<u64> {
        if query.filters.is_empty() {
            return Err(LfError::Internal(format!(
                "refusing unfiltered delete on {}",
                query.table
            )));
        }
        let url = self.rest_url(&query.table);
        let resp = self
            .request(
                Method::DELETE,
                &url,
                &query.filter_params(),
                None,
                Some(RETURN_REPRESENTATION),
            )
            .await?;
        Ok(into_rows(Self::json_body(resp).await?)?.len() as u64)
    }

    /// POST to a stored procedure with named arguments.
    pub async fn call_rpc(&self, function: &str, args: &Value) -> LfResult<Value> {
        let url = self.rpc_url(function);
        let resp = self
            .request(Method::POST, &url, &[], Some(args), None)
            .await?;
        Self::json_body(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_rows_shapes() {
        assert_eq!(into_rows(json!([{"id": 1}, {"id": 2}])).unwrap().len(), 2);
        assert_eq!(into_rows(json!({"id": 1})).unwrap().len(), 1);
        assert!(into_rows(Value::Null).unwrap().is_empty());
        assert!(into_rows(json!(3)).is_err());
    }
}
