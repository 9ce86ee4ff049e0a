//! Built-in canonical schemas, one per entity kind.

use gardenkeep_model::{EntityKind, Field, FieldCategory};
use serde::Serialize;

/// A canonical field together with the explicit spellings that mean it.
///
/// Naming-convention variants (snake_case, camelCase, ...) of the name and
/// of every alias are derived when the alias table is built, so they are not
/// listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanonicalField {
    pub field: Field,
    pub aliases: &'static [&'static str],
}

impl CanonicalField {
    pub const fn new(field: Field, aliases: &'static [&'static str]) -> Self {
        Self { field, aliases }
    }

    pub fn name(&self) -> &'static str {
        self.field.name()
    }

    pub fn category(&self) -> FieldCategory {
        self.field.category()
    }
}

const PLANT_FIELDS: &[CanonicalField] = &[
    CanonicalField::new(Field::PlantId, &["id", "plant id", "plantid", "plant number"]),
    CanonicalField::new(
        Field::PlantName,
        &["name", "plant", "common name", "plant name"],
    ),
    CanonicalField::new(Field::Description, &["desc", "about", "overview", "summary"]),
    CanonicalField::new(
        Field::LightRequirements,
        &["light", "sun", "sunlight", "light requirement", "sun exposure", "light needs"],
    ),
    CanonicalField::new(
        Field::WateringNeeds,
        &["water", "watering", "water needs", "watering requirements", "watering schedule"],
    ),
    CanonicalField::new(
        Field::SoilPreferences,
        &["soil", "soil type", "soil preference", "soil requirements"],
    ),
    CanonicalField::new(
        Field::FertilizingSchedule,
        &["fertilizer", "fertilizing", "fertilization", "feeding", "feeding schedule"],
    ),
    CanonicalField::new(
        Field::PruningInstructions,
        &["pruning", "prune", "pruning needs", "pruning schedule"],
    ),
    CanonicalField::new(Field::MulchingNeeds, &["mulch", "mulching", "mulching instructions"]),
    CanonicalField::new(
        Field::WinterizingInstructions,
        &["winterizing", "winter care", "winterization", "overwintering"],
    ),
    CanonicalField::new(
        Field::SpacingRequirements,
        &["spacing", "plant spacing", "spacing needs"],
    ),
    CanonicalField::new(
        Field::FrostTolerance,
        &["frost", "hardiness", "cold hardiness", "cold tolerance"],
    ),
    CanonicalField::new(
        Field::CareNotes,
        &["notes", "care", "care instructions", "additional notes"],
    ),
    CanonicalField::new(
        Field::Location,
        &["garden location", "planted in", "bed", "placement"],
    ),
    CanonicalField::new(
        Field::PhotoUrl,
        &["photo", "image", "image url", "picture", "photo link"],
    ),
    CanonicalField::new(
        Field::RawPhotoUrl,
        &["raw photo", "original photo url", "raw image url", "raw photo link"],
    ),
    CanonicalField::new(
        Field::LastUpdated,
        &["updated", "updated at", "last modified", "modified at", "timestamp"],
    ),
];

const LOG_FIELDS: &[CanonicalField] = &[
    CanonicalField::new(Field::LogId, &["id", "log id", "entry id", "logid"]),
    CanonicalField::new(Field::PlantName, &["name", "plant", "plant name"]),
    CanonicalField::new(
        Field::LogDate,
        &["date", "entry date", "logged at", "logged on", "timestamp"],
    ),
    CanonicalField::new(Field::LogTitle, &["title", "subject", "entry title", "heading"]),
    CanonicalField::new(
        Field::SymptomsObserved,
        &["symptoms", "symptom", "observations", "observed symptoms"],
    ),
    CanonicalField::new(Field::Diagnosis, &["issue", "problem", "health issue"]),
    CanonicalField::new(
        Field::TreatmentRecommendation,
        &["treatment", "remedy", "recommendation", "treatment plan"],
    ),
    CanonicalField::new(
        Field::UserNotes,
        &["notes", "user note", "comments", "comment", "note"],
    ),
    CanonicalField::new(
        Field::FollowUpRequired,
        &["follow up", "needs follow up", "followup required", "requires follow up"],
    ),
    CanonicalField::new(
        Field::FollowUpDate,
        &["followup date", "next check", "next check date", "check back"],
    ),
    CanonicalField::new(Field::ConfidenceScore, &["confidence", "score", "ai confidence"]),
    CanonicalField::new(Field::AnalysisType, &["analysis", "type", "entry type"]),
    CanonicalField::new(Field::WeatherConditions, &["weather", "conditions", "forecast"]),
    CanonicalField::new(Field::PhotoUrl, &["photo", "image", "image url", "picture"]),
    CanonicalField::new(Field::RawPhotoUrl, &["raw photo", "original photo url"]),
    CanonicalField::new(Field::LastUpdated, &["updated", "updated at", "last modified"]),
];

/// The built-in schema for an entity kind, in column order.
pub fn schema(kind: EntityKind) -> &'static [CanonicalField] {
    match kind {
        EntityKind::Plant => PLANT_FIELDS,
        EntityKind::LogEntry => LOG_FIELDS,
    }
}
