//! Core domain model for gardenkeep record handling.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `Field`: The canonical schema, one variant per logical attribute
//! - `EntityKind`: Plant records and care log entries
//! - `Record`: One row of a candidate snapshot
//! - `MatchCandidate` / `ResolutionResult`: The output of entity resolution

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error("Unknown canonical field: {0}")]
    UnknownField(String),
}

/// The kinds of record the API manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Plant,
    LogEntry,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Plant, EntityKind::LogEntry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plant => "plant",
            Self::LogEntry => "log entry",
        }
    }

    /// The column holding the record's numeric identifier.
    pub fn id_field(&self) -> Field {
        match self {
            Self::Plant => Field::PlantId,
            Self::LogEntry => Field::LogId,
        }
    }

    /// The column used as the record's display name when resolving.
    pub fn name_field(&self) -> Field {
        match self {
            Self::Plant => Field::PlantName,
            Self::LogEntry => Field::LogTitle,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "plant" | "plants" => Ok(Self::Plant),
            "log" | "logs" | "log entry" | "log entries" => Ok(Self::LogEntry),
            _ => Err(ModelError::UnknownEntityKind(s.to_string())),
        }
    }
}

/// Grouping tag for a canonical field.
///
/// Only used for organization and validation, never for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Identity,
    CareAttribute,
    Media,
    Metadata,
}

impl FieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::CareAttribute => "care_attribute",
            Self::Media => "media",
            Self::Metadata => "metadata",
        }
    }
}

/// A canonical field of the record schema.
///
/// Handler code dispatches on this enum rather than on field name strings,
/// so adding a field means touching the schema in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    // Plant records
    PlantId,
    PlantName,
    Description,
    LightRequirements,
    WateringNeeds,
    SoilPreferences,
    FertilizingSchedule,
    PruningInstructions,
    MulchingNeeds,
    WinterizingInstructions,
    SpacingRequirements,
    FrostTolerance,
    CareNotes,
    Location,
    PhotoUrl,
    RawPhotoUrl,
    LastUpdated,

    // Log entries
    LogId,
    LogDate,
    LogTitle,
    SymptomsObserved,
    Diagnosis,
    TreatmentRecommendation,
    UserNotes,
    FollowUpRequired,
    FollowUpDate,
    ConfidenceScore,
    AnalysisType,
    WeatherConditions,
}

impl Field {
    pub const ALL: [Field; 29] = [
        Field::PlantId,
        Field::PlantName,
        Field::Description,
        Field::LightRequirements,
        Field::WateringNeeds,
        Field::SoilPreferences,
        Field::FertilizingSchedule,
        Field::PruningInstructions,
        Field::MulchingNeeds,
        Field::WinterizingInstructions,
        Field::SpacingRequirements,
        Field::FrostTolerance,
        Field::CareNotes,
        Field::Location,
        Field::PhotoUrl,
        Field::RawPhotoUrl,
        Field::LastUpdated,
        Field::LogId,
        Field::LogDate,
        Field::LogTitle,
        Field::SymptomsObserved,
        Field::Diagnosis,
        Field::TreatmentRecommendation,
        Field::UserNotes,
        Field::FollowUpRequired,
        Field::FollowUpDate,
        Field::ConfidenceScore,
        Field::AnalysisType,
        Field::WeatherConditions,
    ];

    /// The single authoritative name of this field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlantId => "Plant ID",
            Self::PlantName => "Plant Name",
            Self::Description => "Description",
            Self::LightRequirements => "Light Requirements",
            Self::WateringNeeds => "Watering Needs",
            Self::SoilPreferences => "Soil Preferences",
            Self::FertilizingSchedule => "Fertilizing Schedule",
            Self::PruningInstructions => "Pruning Instructions",
            Self::MulchingNeeds => "Mulching Needs",
            Self::WinterizingInstructions => "Winterizing Instructions",
            Self::SpacingRequirements => "Spacing Requirements",
            Self::FrostTolerance => "Frost Tolerance",
            Self::CareNotes => "Care Notes",
            Self::Location => "Location",
            Self::PhotoUrl => "Photo URL",
            Self::RawPhotoUrl => "Raw Photo URL",
            Self::LastUpdated => "Last Updated",
            Self::LogId => "Log ID",
            Self::LogDate => "Log Date",
            Self::LogTitle => "Log Title",
            Self::SymptomsObserved => "Symptoms Observed",
            Self::Diagnosis => "Diagnosis",
            Self::TreatmentRecommendation => "Treatment Recommendation",
            Self::UserNotes => "User Notes",
            Self::FollowUpRequired => "Follow-up Required",
            Self::FollowUpDate => "Follow-up Date",
            Self::ConfidenceScore => "Confidence Score",
            Self::AnalysisType => "Analysis Type",
            Self::WeatherConditions => "Weather Conditions",
        }
    }

    pub fn category(&self) -> FieldCategory {
        match self {
            Self::PlantId | Self::PlantName | Self::LogId | Self::LogTitle => {
                FieldCategory::Identity
            }
            Self::PhotoUrl | Self::RawPhotoUrl => FieldCategory::Media,
            Self::LastUpdated
            | Self::LogDate
            | Self::ConfidenceScore
            | Self::AnalysisType => FieldCategory::Metadata,
            _ => FieldCategory::CareAttribute,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AsRef<str> for Field {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl FromStr for Field {
    type Err = ModelError;

    /// Parse a canonical field name (case-insensitive). Aliases are not
    /// accepted here; use the field normalizer for those.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownField(s.to_string()))
    }
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The pair of columns the resolver reads from each candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Column holding the numeric identifier
    pub id: String,
    /// Column holding the display name
    pub name: String,
}

impl FieldRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn for_kind(kind: EntityKind) -> Self {
        Self::new(kind.id_field().name(), kind.name_field().name())
    }
}

/// One row of a record snapshot, keyed by canonical column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Position of the row within the snapshot
    pub row: usize,

    /// Column values
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            fields: Map::new(),
        }
    }

    /// Builder-style setter, mostly useful in tests.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Text rendering of a column value.
    ///
    /// Strings are returned as-is, numbers and booleans are formatted, and
    /// nulls, arrays and objects count as absent.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Reference to a candidate record inside the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub row: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,
}

impl RecordRef {
    pub fn from_record(record: &Record, fields: &FieldRef) -> Self {
        Self {
            row: record.row,
            id: record.text(&fields.id),
            name: record.text(&fields.name).unwrap_or_default(),
        }
    }
}

/// Strategy that produced a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Substring,
    WordOverlap,
    Fuzzy,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::WordOverlap => "word_overlap",
            Self::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucketing of a match score for caller-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub record_ref: RecordRef,

    /// Weighted score in [0.0, 1.0]
    pub score: f32,

    pub method: MatchMethod,
}

/// Outcome of resolving one identifier against one snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Whether the best score cleared the acceptance threshold
    pub found: bool,

    /// Top candidate, absent if nothing scored above zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<MatchCandidate>,

    #[serde(default)]
    pub confidence: Confidence,

    /// Candidates for "did you mean" suggestions, best first. When `found`
    /// is false this includes `best` if it cleared the suggestion threshold.
    #[serde(default)]
    pub alternatives: Vec<MatchCandidate>,
}

impl ResolutionResult {
    /// A result with nothing matched and nothing to suggest.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// An authoritative single match.
    pub fn exact(record_ref: RecordRef) -> Self {
        Self {
            found: true,
            best: Some(MatchCandidate {
                record_ref,
                score: 1.0,
                method: MatchMethod::Exact,
            }),
            confidence: Confidence::High,
            alternatives: Vec::new(),
        }
    }

    /// Alternatives, other than the best itself, scoring exactly as well as it.
    pub fn ties(&self) -> impl Iterator<Item = &MatchCandidate> {
        let best_score = self.best.as_ref().map(|b| b.score);
        let best_ref = self.best.as_ref().map(|b| &b.record_ref);
        self.alternatives
            .iter()
            .filter(move |alt| Some(alt.score) == best_score)
            .filter(move |alt| Some(&alt.record_ref) != best_ref)
    }
}
