//! Record store backed by a JSON-over-HTTP sheet service.
//!
//! The service exposes `GET /headers` (array of column names),
//! `GET /rows` (array of row arrays) and `GET /health`.

use std::time::Duration;

use gardenkeep_model::Record;
use gardenkeep_schema::AliasTable;
use serde::Deserialize;
use serde_json::Value;

use crate::{ColumnMap, RecordStore, StoreError};

/// HTTP store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpStoreConfig {
    /// Base URL of the sheet service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Record store reading one sheet over HTTP.
pub struct HttpStore {
    config: HttpStoreConfig,
    table: AliasTable,
    client: reqwest::Client,
}

impl HttpStore {
    /// Create a store for the sheet whose headers follow `table`'s schema.
    pub fn new(config: HttpStoreConfig, table: AliasTable) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            config,
            table,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, StoreError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "Fetching from record store");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::ParseError(e.to_string()))
    }

    /// Check that the service answers.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl RecordStore for HttpStore {
    async fn list_records(&self) -> Result<Vec<Record>, StoreError> {
        let headers = self.schema_headers().await?;
        let columns = ColumnMap::build(&headers, &self.table);
        let rows = self.get_json("rows").await?;
        parse_rows(&columns, rows)
    }

    async fn schema_headers(&self) -> Result<Vec<String>, StoreError> {
        let json = self.get_json("headers").await?;
        parse_headers(json)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Parse a JSON array of column names.
pub(crate) fn parse_headers(json: Value) -> Result<Vec<String>, StoreError> {
    let Value::Array(items) = json else {
        return Err(StoreError::ParseError("Headers must be an array".to_string()));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(StoreError::ParseError(format!(
                "Header must be a string, got {}",
                other
            ))),
        })
        .collect()
}

/// Parse a JSON array of row arrays into records.
pub(crate) fn parse_rows(columns: &ColumnMap, json: Value) -> Result<Vec<Record>, StoreError> {
    let Value::Array(rows) = json else {
        return Err(StoreError::ParseError("Rows must be an array".to_string()));
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Array(cells) => Ok(columns.record(i, cells)),
            _ => Err(StoreError::ParseError(format!("Row {} is not an array", i))),
        })
        .collect()
}
