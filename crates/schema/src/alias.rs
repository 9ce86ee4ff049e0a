//! Alias table: every known input spelling mapped to one canonical field.

use std::collections::HashMap;

use gardenkeep_features::{
    collapse_underscore_runs, lookup_key, naming_variants, separators_to_spaces, split_camel_case,
};
use gardenkeep_model::{EntityKind, Field};

use crate::fields::{schema, CanonicalField};
use crate::SchemaError;

/// Key rewrites tried by [`AliasTable::normalize_key`], in increasing
/// aggressiveness. Each one is applied on top of the previous result.
const KEY_TRANSFORMS: [(&str, fn(&str) -> String); 3] = [
    ("underscore_runs", collapse_underscore_runs),
    ("separators", separators_to_spaces),
    ("camel_case", split_camel_case),
];

/// Case-insensitive, immutable mapping from input spellings to fields.
///
/// Built once per entity kind at start-up. Construction fails if two
/// different fields claim the same spelling.
#[derive(Debug, Clone)]
pub struct AliasTable {
    kind: EntityKind,
    fields: Vec<CanonicalField>,
    entries: HashMap<String, Field>,
}

impl AliasTable {
    /// Build the table for one of the built-in schemas.
    pub fn for_kind(kind: EntityKind) -> Result<Self, SchemaError> {
        Self::build(kind, schema(kind))
    }

    /// Build a table from explicit field definitions.
    ///
    /// Registers, for each field, its canonical name and every explicit
    /// alias, plus the snake_case, kebab-case and compact spellings of each.
    pub fn build(kind: EntityKind, fields: &[CanonicalField]) -> Result<Self, SchemaError> {
        let mut entries: HashMap<String, Field> = HashMap::new();

        for (i, def) in fields.iter().enumerate() {
            if fields[..i].iter().any(|earlier| earlier.field == def.field) {
                return Err(SchemaError::DuplicateField {
                    kind,
                    field: def.field,
                });
            }

            for spelling in std::iter::once(def.name()).chain(def.aliases.iter().copied()) {
                let explicit = lookup_key(spelling);
                if explicit.is_empty() {
                    return Err(SchemaError::EmptyAlias {
                        kind,
                        field: def.field,
                    });
                }

                for key in std::iter::once(explicit).chain(naming_variants(spelling)) {
                    match entries.get(&key) {
                        Some(existing) if *existing != def.field => {
                            return Err(SchemaError::AliasCollision {
                                kind,
                                alias: key,
                                first: *existing,
                                second: def.field,
                            });
                        }
                        Some(_) => {}
                        None => {
                            entries.insert(key, def.field);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            kind = %kind,
            fields = fields.len(),
            spellings = entries.len(),
            "Built alias table"
        );

        Ok(Self {
            kind,
            fields: fields.to_vec(),
            entries,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Field definitions in schema order.
    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    /// Number of registered spellings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_field(&self, field: Field) -> bool {
        self.fields.iter().any(|def| def.field == field)
    }

    /// Direct case-insensitive lookup, no transforms.
    pub fn lookup(&self, key: &str) -> Option<Field> {
        self.entries.get(&lookup_key(key)).copied()
    }

    /// Map an arbitrary input key to its canonical field.
    ///
    /// Tries, in order: the canonical names themselves, a direct alias
    /// lookup, then each of the key transforms cumulatively. Returns `None`
    /// for keys that match nothing; that is an expected outcome, not an error.
    pub fn normalize_key(&self, raw_key: &str) -> Option<Field> {
        let trimmed = raw_key.trim();
        if trimmed.is_empty() {
            return None;
        }

        let lowered = trimmed.to_lowercase();
        if let Some(def) = self
            .fields
            .iter()
            .find(|def| def.name().to_lowercase() == lowered)
        {
            return Some(def.field);
        }

        if let Some(field) = self.lookup(&lowered) {
            return Some(field);
        }

        let mut rewritten = trimmed.to_string();
        for (name, transform) in KEY_TRANSFORMS {
            rewritten = transform(&rewritten);
            if let Some(field) = self.lookup(&rewritten) {
                tracing::trace!(key = raw_key, transform = name, field = %field, "Key matched after rewrite");
                return Some(field);
            }
        }

        None
    }
}
