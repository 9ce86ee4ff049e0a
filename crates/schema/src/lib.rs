//! Canonical schema, alias tables and field normalization.
//!
//! Callers name the same attribute in many ways (`"Plant Name"`,
//! `plant_name`, `plantName`, `Plant___Name`, `name`). This crate maps any
//! of those spellings to one [`Field`] before business logic runs.
//!
//! The tables are built once at start-up through [`FieldRegistry::builtin`]
//! and are immutable afterwards, so a registry can be shared freely across
//! request threads.

mod alias;
mod fields;

pub use alias::AliasTable;
pub use fields::{schema, CanonicalField};

use gardenkeep_model::{EntityKind, Field};
use thiserror::Error;

/// Configuration errors detected while building alias tables.
///
/// These are fatal: a process with an inconsistent schema must not serve
/// traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{kind} schema: alias '{alias}' maps to both '{first}' and '{second}'")]
    AliasCollision {
        kind: EntityKind,
        alias: String,
        first: Field,
        second: Field,
    },

    #[error("{kind} schema: field '{field}' is defined twice")]
    DuplicateField { kind: EntityKind, field: Field },

    #[error("{kind} schema: field '{field}' has a blank alias")]
    EmptyAlias { kind: EntityKind, field: Field },
}

/// Alias tables for every entity kind.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    plant: AliasTable,
    log_entry: AliasTable,
}

impl FieldRegistry {
    /// Build and validate the built-in schemas.
    pub fn builtin() -> Result<Self, SchemaError> {
        Ok(Self {
            plant: AliasTable::for_kind(EntityKind::Plant)?,
            log_entry: AliasTable::for_kind(EntityKind::LogEntry)?,
        })
    }

    pub fn table(&self, kind: EntityKind) -> &AliasTable {
        match kind {
            EntityKind::Plant => &self.plant,
            EntityKind::LogEntry => &self.log_entry,
        }
    }

    /// Shorthand for `self.table(kind).normalize_key(raw_key)`.
    pub fn normalize_key(&self, kind: EntityKind, raw_key: &str) -> Option<Field> {
        self.table(kind).normalize_key(raw_key)
    }
}
