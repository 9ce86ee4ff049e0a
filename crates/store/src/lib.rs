//! Record storage boundary.
//!
//! Provides the `RecordStore` trait the request handlers fetch candidate
//! snapshots from, an in-memory and an HTTP implementation, the snapshot
//! cache, and the header-to-field column map. Resolution itself never
//! touches a store; handlers fetch a snapshot and pass it in.

mod cache;
mod columns;
mod http;

pub use cache::SnapshotCache;
pub use columns::ColumnMap;
pub use http::{HttpStore, HttpStoreConfig};

use std::future::Future;

use gardenkeep_model::Record;
use gardenkeep_schema::AliasTable;
use serde_json::Value;
use thiserror::Error;

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Store not available")]
    Unavailable,
}

/// Trait for record storage backends.
pub trait RecordStore {
    /// Every record of the sheet, keyed by canonical column names.
    fn list_records(&self) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// The sheet's header row as stored.
    fn schema_headers(&self) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Get the store name for logging.
    fn name(&self) -> &'static str;
}

/// Record store holding one sheet in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl MemoryStore {
    /// Build from a header row and rows of cells, canonicalizing headers
    /// with `table`.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>, table: &AliasTable) -> Self {
        let columns = ColumnMap::build(&headers, table);
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| columns.record(i, cells))
            .collect();
        Self { headers, records }
    }

    /// Build from JSON.
    ///
    /// Accepts either `{"headers": [...], "rows": [[...], ...]}` or an array
    /// of objects whose keys are canonicalized with `table`.
    pub fn from_json(json: Value, table: &AliasTable) -> Result<Self, StoreError> {
        match json {
            Value::Object(mut sheet) if sheet.contains_key("headers") => {
                let headers = http::parse_headers(sheet.remove("headers").unwrap_or_default())?;
                let columns = ColumnMap::build(&headers, table);
                let rows = sheet.remove("rows").unwrap_or(Value::Array(vec![]));
                let records = http::parse_rows(&columns, rows)?;
                Ok(Self { headers, records })
            }
            Value::Array(objects) => {
                let mut headers: Vec<String> = Vec::new();
                let mut records = Vec::with_capacity(objects.len());
                for (i, object) in objects.into_iter().enumerate() {
                    let Value::Object(map) = object else {
                        return Err(StoreError::ParseError(format!(
                            "Record {} is not an object",
                            i
                        )));
                    };
                    let mut record = Record::new(i);
                    for (key, value) in map {
                        if !headers.contains(&key) {
                            headers.push(key.clone());
                        }
                        let column = table
                            .normalize_key(&key)
                            .map(|field| field.name().to_string())
                            .unwrap_or(key);
                        record.fields.insert(column, value);
                    }
                    records.push(record);
                }
                Ok(Self { headers, records })
            }
            _ => Err(StoreError::ParseError(
                "Expected a sheet object or an array of records".to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    async fn list_records(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.clone())
    }

    async fn schema_headers(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.headers.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
