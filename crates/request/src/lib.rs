//! Per-request payload normalization.
//!
//! Wraps an inbound key/value payload, maps every key through the field
//! normalizer, and keeps both the submitted and the canonical view so
//! handlers can read fields by canonical name.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use gardenkeep_model::{EntityKind, Field};
use gardenkeep_schema::AliasTable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by the request layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Unrecognized {kind} field(s): {}", keys.join(", "))]
    UnrecognizedFields { kind: EntityKind, keys: Vec<String> },

    #[error("Payload must be a JSON object, got {0}")]
    InvalidPayload(&'static str),

    #[error("Unknown normalization mode: {0}")]
    UnknownMode(String),
}

impl RequestError {
    /// HTTP status the API layer reports for this error.
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// How unrecognized keys are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Unknown keys are collected for rejection (write endpoints)
    #[default]
    Strict,
    /// Unknown keys pass through unchanged (diagnostic paths)
    Lenient,
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

impl FromStr for NormalizeMode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(RequestError::UnknownMode(s.to_string())),
        }
    }
}

/// A payload after key canonicalization.
///
/// Created once per inbound request and dropped with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRequest {
    kind: EntityKind,
    mode: NormalizeMode,
    original: Map<String, Value>,
    canonical: Map<String, Value>,
    unrecognized: Vec<String>,
    #[serde(skip)]
    recognized: BTreeSet<Field>,
}

impl NormalizedRequest {
    /// Normalize a payload against one entity kind's alias table.
    ///
    /// Keys are visited in submission order; when two keys map to the same
    /// canonical field the later one wins.
    pub fn new(table: &AliasTable, payload: Map<String, Value>, mode: NormalizeMode) -> Self {
        let mut canonical = Map::new();
        let mut unrecognized = Vec::new();
        let mut recognized = BTreeSet::new();

        for (key, value) in &payload {
            match table.normalize_key(key) {
                Some(field) => {
                    canonical.insert(field.name().to_string(), value.clone());
                    recognized.insert(field);
                }
                None => match mode {
                    NormalizeMode::Strict => unrecognized.push(key.clone()),
                    NormalizeMode::Lenient => {
                        canonical.insert(key.clone(), value.clone());
                    }
                },
            }
        }

        if !unrecognized.is_empty() {
            tracing::debug!(
                kind = %table.kind(),
                keys = ?unrecognized,
                "Payload has unrecognized keys"
            );
        }

        Self {
            kind: table.kind(),
            mode,
            original: payload,
            canonical,
            unrecognized,
            recognized,
        }
    }

    /// Normalize an arbitrary JSON value, which must be an object.
    pub fn from_json(
        table: &AliasTable,
        payload: Value,
        mode: NormalizeMode,
    ) -> Result<Self, RequestError> {
        match payload {
            Value::Object(map) => Ok(Self::new(table, map, mode)),
            other => Err(RequestError::InvalidPayload(json_type(&other))),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn mode(&self) -> NormalizeMode {
        self.mode
    }

    /// Key/value pairs exactly as submitted.
    pub fn original(&self) -> &Map<String, Value> {
        &self.original
    }

    /// Key/value pairs under canonical names (plus pass-through keys in
    /// lenient mode).
    pub fn canonical(&self) -> &Map<String, Value> {
        &self.canonical
    }

    /// Submitted keys that matched no field (strict mode only).
    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    /// Fail with every offending key if anything went unrecognized.
    pub fn ensure_recognized(&self) -> Result<(), RequestError> {
        if self.unrecognized.is_empty() {
            Ok(())
        } else {
            Err(RequestError::UnrecognizedFields {
                kind: self.kind,
                keys: self.unrecognized.clone(),
            })
        }
    }

    /// Look up a field, falling back to legacy spellings of the original
    /// payload.
    ///
    /// `legacy_aliases` exist only for older call sites that read one
    /// specific spelling before canonicalization; new code passes `&[]`.
    pub fn get(&self, field: Field, legacy_aliases: &[&str]) -> Option<&Value> {
        let canonical = if self.recognized.contains(&field) {
            self.canonical.get(field.name())
        } else {
            None
        };
        canonical.or_else(|| {
            legacy_aliases
                .iter()
                .find_map(|alias| self.original.get(*alias))
        })
    }

    /// Like [`get`](Self::get), returning `default` when the field is absent.
    pub fn get_or<'a>(
        &'a self,
        field: Field,
        legacy_aliases: &[&str],
        default: &'a Value,
    ) -> &'a Value {
        self.get(field, legacy_aliases).unwrap_or(default)
    }

    /// Text rendering of a field: strings as-is, numbers and booleans
    /// formatted, anything else absent.
    pub fn text(&self, field: Field, legacy_aliases: &[&str]) -> Option<String> {
        match self.get(field, legacy_aliases)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Like [`text`](Self::text), returning `default` when absent.
    pub fn text_or(&self, field: Field, legacy_aliases: &[&str], default: &str) -> String {
        self.text(field, legacy_aliases)
            .unwrap_or_else(|| default.to_string())
    }

    /// Canonical fields present in the payload, in canonical-map order.
    ///
    /// Only fields recognized by this kind's alias table are yielded, so
    /// lenient pass-through keys never show up, even when one spells a
    /// field of another entity kind.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.canonical.iter().filter_map(|(key, value)| {
            let field = key.parse::<Field>().ok()?;
            self.recognized.contains(&field).then_some((field, value))
        })
    }

    pub fn into_canonical(self) -> Map<String, Value> {
        self.canonical
    }
}

/// Normalize a payload.
pub fn normalize(
    table: &AliasTable,
    payload: Map<String, Value>,
    mode: NormalizeMode,
) -> NormalizedRequest {
    NormalizedRequest::new(table, payload, mode)
}

/// Normalize a payload for a write endpoint, rejecting unknown keys.
pub fn normalize_strict(
    table: &AliasTable,
    payload: Map<String, Value>,
) -> Result<NormalizedRequest, RequestError> {
    let request = NormalizedRequest::new(table, payload, NormalizeMode::Strict);
    request.ensure_recognized()?;
    Ok(request)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
