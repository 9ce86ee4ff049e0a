//! Mapping from a store's header row to canonical fields.

use std::collections::BTreeMap;

use gardenkeep_model::{Field, Record};
use gardenkeep_schema::AliasTable;
use serde_json::{Map, Value};

/// Column positions of canonical fields within a header row.
///
/// Headers that normalize to no field keep their original spelling so rows
/// survive a schema drift without losing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: Vec<String>,
    positions: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn build(headers: &[String], table: &AliasTable) -> Self {
        let mut columns = Vec::with_capacity(headers.len());
        let mut positions = BTreeMap::new();

        for (i, header) in headers.iter().enumerate() {
            match table.normalize_key(header) {
                // first occurrence wins for duplicate headers
                Some(field) if !positions.contains_key(&field) => {
                    positions.insert(field, i);
                    columns.push(field.name().to_string());
                }
                _ => columns.push(header.trim().to_string()),
            }
        }

        let unmapped = headers.len() - positions.len();
        if unmapped > 0 {
            tracing::debug!(kind = %table.kind(), unmapped, "Headers without a canonical field");
        }

        Self { columns, positions }
    }

    /// Position of a field's column, if the store has one.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    /// Column names after canonicalization, in store order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Canonical fields the table declares but the store lacks.
    pub fn missing(&self, table: &AliasTable) -> Vec<Field> {
        table
            .fields()
            .iter()
            .map(|def| def.field)
            .filter(|field| !self.positions.contains_key(field))
            .collect()
    }

    /// Build a record from one row of cell values.
    ///
    /// Short rows leave trailing columns unset and extra cells are dropped.
    pub fn record(&self, row: usize, cells: Vec<Value>) -> Record {
        let mut fields = Map::new();
        for (column, cell) in self.columns.iter().zip(cells) {
            if !fields.contains_key(column) {
                fields.insert(column.clone(), cell);
            }
        }
        Record { row, fields }
    }
}
