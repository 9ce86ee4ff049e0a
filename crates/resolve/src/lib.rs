//! Entity resolution for "ID or name" parameters.
//!
//! Takes a caller-supplied identifier and a snapshot of candidate records
//! and picks the single best match using tiered strategies:
//! numeric identifier, exact name, then scored substring / word overlap /
//! fuzzy matching.

use std::cmp::Ordering;

use gardenkeep_features::{
    edit_similarity, fold_case, normalize_name, substring_ratio, word_overlap,
};
use gardenkeep_model::{
    Confidence, FieldRef, MatchCandidate, MatchMethod, Record, RecordRef, ResolutionResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structurally invalid resolver input.
///
/// A poor match is never an error; it is reported through
/// `ResolutionResult::found`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("Empty identifier")]
    EmptyIdentifier,

    #[error("Candidate snapshot is empty")]
    EmptySnapshot,

    #[error("Invalid field reference: {0}")]
    InvalidFieldRef(String),

    #[error("Invalid resolver config: {0}")]
    InvalidConfig(String),
}

/// Weights and thresholds for the scored tier.
///
/// The defaults were picked empirically; treat them as tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Weight for substring containment
    pub substring_weight: f32,
    /// Weight for word-set Jaccard overlap
    pub word_overlap_weight: f32,
    /// Weight for edit similarity
    pub fuzzy_weight: f32,
    /// Raw edit similarity must exceed this to count
    pub fuzzy_floor: f32,
    /// Best score needed for `found`
    pub accept_threshold: f32,
    /// Score an alternative must exceed to be suggested
    pub alternative_threshold: f32,
    /// Maximum number of alternatives returned
    pub max_alternatives: usize,
    /// Lower bound for high confidence
    pub high_confidence: f32,
    /// Lower bound for medium confidence
    pub medium_confidence: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            substring_weight: 0.9,
            word_overlap_weight: 0.8,
            fuzzy_weight: 0.7,
            fuzzy_floor: 0.6,
            accept_threshold: 0.6,
            alternative_threshold: 0.5,
            max_alternatives: 3,
            high_confidence: 0.9,
            medium_confidence: 0.7,
        }
    }
}

impl ResolverConfig {
    /// Parse a config from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ResolveError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ResolveError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every weight and threshold lies in [0.0, 1.0] and that the
    /// confidence bands are ordered.
    pub fn validate(&self) -> Result<(), ResolveError> {
        let unit = [
            ("substring_weight", self.substring_weight),
            ("word_overlap_weight", self.word_overlap_weight),
            ("fuzzy_weight", self.fuzzy_weight),
            ("fuzzy_floor", self.fuzzy_floor),
            ("accept_threshold", self.accept_threshold),
            ("alternative_threshold", self.alternative_threshold),
            ("high_confidence", self.high_confidence),
            ("medium_confidence", self.medium_confidence),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ResolveError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(self.accept_threshold <= self.medium_confidence
            && self.medium_confidence <= self.high_confidence)
        {
            return Err(ResolveError::InvalidConfig(
                "expected accept_threshold <= medium_confidence <= high_confidence".to_string(),
            ));
        }

        Ok(())
    }

    /// Confidence tier for an accepted score.
    fn confidence(&self, score: f32) -> Confidence {
        if score >= self.high_confidence {
            Confidence::High
        } else if score >= self.medium_confidence {
            Confidence::Medium
        } else if score >= self.accept_threshold {
            Confidence::Low
        } else {
            Confidence::None
        }
    }
}

/// Resolve an identifier against a candidate snapshot.
///
/// Tiers short-circuit in order:
/// 1. an integer identifier matching a record's identifier column;
/// 2. a case-insensitive exact name match;
/// 3. the best weighted substring / word-overlap / fuzzy score.
///
/// Ties in the scored tier go to the shorter name, then to the earlier row,
/// so the same input always yields the same result. The resolver never
/// reports ambiguity itself; callers inspect `alternatives` for that.
pub fn resolve(
    identifier: &str,
    candidates: &[Record],
    fields: &FieldRef,
    config: &ResolverConfig,
) -> Result<ResolutionResult, ResolveError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ResolveError::EmptyIdentifier);
    }
    validate_fields(fields)?;
    if candidates.is_empty() {
        return Err(ResolveError::EmptySnapshot);
    }

    if let Some(record) = match_numeric_id(identifier, candidates, &fields.id) {
        tracing::debug!(identifier, row = record.row, "Resolved by numeric identifier");
        return Ok(ResolutionResult::exact(RecordRef::from_record(record, fields)));
    }

    let folded = fold_case(identifier);
    if let Some(record) = candidates.iter().find(|record| {
        record
            .text(&fields.name)
            .is_some_and(|name| fold_case(&name) == folded)
    }) {
        tracing::debug!(identifier, row = record.row, "Resolved by exact name");
        return Ok(ResolutionResult::exact(RecordRef::from_record(record, fields)));
    }

    let ranked = rank(identifier, candidates, fields, config);
    let result = decide(ranked, config);

    tracing::debug!(
        identifier,
        found = result.found,
        confidence = %result.confidence,
        best = result.best.as_ref().map(|b| b.record_ref.name.as_str()),
        alternatives = result.alternatives.len(),
        "Resolved by scoring"
    );

    Ok(result)
}

/// Score every candidate and return those above zero, best first.
///
/// This is the scored tier on its own, without the exact short-circuits.
pub fn rank(
    identifier: &str,
    candidates: &[Record],
    fields: &FieldRef,
    config: &ResolverConfig,
) -> Vec<MatchCandidate> {
    let query = normalize_name(identifier);

    let mut scored: Vec<(MatchCandidate, usize)> = candidates
        .iter()
        .filter_map(|record| {
            let name = record.text(&fields.name)?;
            let (score, method) = score_name(&query, &normalize_name(&name), config)?;
            let name_len = name.trim().chars().count();
            Some((
                MatchCandidate {
                    record_ref: RecordRef::from_record(record, fields),
                    score,
                    method,
                },
                name_len,
            ))
        })
        .collect();

    // stable sort keeps snapshot order for full ties
    scored.sort_by(|(a, a_len), (b, b_len)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_len.cmp(b_len))
    });

    tracing::trace!(
        identifier,
        scored = scored.len(),
        total = candidates.len(),
        "Ranked candidates"
    );

    scored.into_iter().map(|(candidate, _)| candidate).collect()
}

/// Best weighted score for one normalized query/name pair.
///
/// On equal scores the earlier strategy wins (substring, word overlap,
/// fuzzy). Returns `None` when nothing scores above zero.
fn score_name(query: &str, name: &str, config: &ResolverConfig) -> Option<(f32, MatchMethod)> {
    let mut best: Option<(f32, MatchMethod)> = None;
    let mut consider = |score: f32, method: MatchMethod| {
        if score > 0.0 && best.map_or(true, |(current, _)| score > current) {
            best = Some((score, method));
        }
    };

    if let Some(ratio) = substring_ratio(query, name) {
        consider(ratio * config.substring_weight, MatchMethod::Substring);
    }

    if let Some(jaccard) = word_overlap(query, name) {
        consider(jaccard * config.word_overlap_weight, MatchMethod::WordOverlap);
    }

    let similarity = edit_similarity(query, name);
    if similarity > config.fuzzy_floor {
        consider(similarity * config.fuzzy_weight, MatchMethod::Fuzzy);
    }

    best
}

/// Apply the acceptance threshold and collect alternatives.
///
/// An accepted best candidate is excluded from its own alternatives. A
/// rejected one stays in the list so near misses still yield suggestions.
fn decide(ranked: Vec<MatchCandidate>, config: &ResolverConfig) -> ResolutionResult {
    let Some(best) = ranked.first().cloned() else {
        return ResolutionResult::not_found();
    };

    let found = best.score >= config.accept_threshold;
    let confidence = if found {
        config.confidence(best.score)
    } else {
        Confidence::None
    };

    let skip = usize::from(found);
    let alternatives = ranked
        .into_iter()
        .skip(skip)
        .filter(|c| c.score > config.alternative_threshold)
        .take(config.max_alternatives)
        .collect();

    ResolutionResult {
        found,
        best: Some(best),
        confidence,
        alternatives,
    }
}

fn match_numeric_id<'a>(
    identifier: &str,
    candidates: &'a [Record],
    id_field: &str,
) -> Option<&'a Record> {
    let wanted: i64 = identifier.parse().ok()?;

    candidates.iter().find(|record| {
        record.text(id_field).is_some_and(|id| {
            let id = id.trim();
            id == identifier || id.parse::<i64>().is_ok_and(|n| n == wanted)
        })
    })
}

fn validate_fields(fields: &FieldRef) -> Result<(), ResolveError> {
    if fields.name.trim().is_empty() {
        return Err(ResolveError::InvalidFieldRef("name column is blank".to_string()));
    }
    if fields.id.trim().is_empty() {
        return Err(ResolveError::InvalidFieldRef("id column is blank".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardenkeep_model::EntityKind;
    use pretty_assertions::assert_eq;

    fn plants(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .enumerate()
            .map(|(row, name)| {
                Record::new(row)
                    .with("Plant ID", (row + 1).to_string())
                    .with("Plant Name", *name)
            })
            .collect()
    }

    fn fields() -> FieldRef {
        FieldRef::for_kind(EntityKind::Plant)
    }

    fn run(identifier: &str, candidates: &[Record]) -> ResolutionResult {
        resolve(identifier, candidates, &fields(), &ResolverConfig::default()).unwrap()
    }

    fn best_name(result: &ResolutionResult) -> &str {
        result.best.as_ref().map(|b| b.record_ref.name.as_str()).unwrap_or("")
    }

    #[test]
    fn test_numeric_id_short_circuit() {
        let candidates = vec![
            Record::new(0).with("Plant ID", "7").with("Plant Name", "142"),
            Record::new(1).with("Plant ID", 142).with("Plant Name", "Fern"),
        ];
        let result = run("142", &candidates);
        assert!(result.found);
        let best = result.best.as_ref().unwrap();
        assert_eq!(best.record_ref.name, "Fern");
        assert_eq!(best.method, MatchMethod::Exact);
        assert_eq!(best.score, 1.0);
        assert_eq!(result.confidence, Confidence::High);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_numeric_id_ignores_leading_zeros() {
        let candidates = vec![Record::new(0)
            .with("Plant ID", "0042")
            .with("Plant Name", "Sage")];
        assert_eq!(best_name(&run("42", &candidates)), "Sage");
    }

    #[test]
    fn test_numeric_identifier_falls_through_to_names() {
        let candidates = plants(&["Rose", "Tomato"]);
        let result = run("99", &candidates);
        assert!(!result.found);
        assert!(result.best.is_none());
    }

    #[test]
    fn test_exact_name_beats_fuzzy() {
        let candidates = plants(&["Rose Garden Variety", "Rose"]);
        let result = run("rose", &candidates);
        let best = result.best.as_ref().unwrap();
        assert_eq!(best.record_ref.name, "Rose");
        assert_eq!(best.score, 1.0);
        assert_eq!(best.method, MatchMethod::Exact);
    }

    #[test]
    fn test_exact_name_prefers_first_row() {
        let candidates = plants(&["Basil", "basil"]);
        let best = run("BASIL", &candidates).best.unwrap();
        assert_eq!(best.record_ref.row, 0);
        assert_eq!(best.record_ref.id.as_deref(), Some("1"));
    }

    #[test]
    fn test_plural_normalization_aids_matching() {
        let candidates = plants(&["Rose"]);
        let result = run("Roses", &candidates);
        assert!(result.found);
        let best = result.best.as_ref().unwrap();
        assert!(matches!(best.method, MatchMethod::Substring | MatchMethod::Fuzzy));
        assert!(best.score >= 0.6);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_below_threshold_has_no_alternatives() {
        let candidates = plants(&["Rose", "Tomato"]);
        let result = run("Xyzzy", &candidates);
        assert!(!result.found);
        assert!(result.alternatives.is_empty());
        assert_eq!(result.confidence, Confidence::None);
    }

    #[test]
    fn test_alternatives_ranked_and_capped() {
        let candidates = plants(&["Rosy", "Rose", "Rosa", "Rosie", "Rosea", "Tomato"]);
        let result = run("Roses", &candidates);
        assert!(result.found);
        assert_eq!(best_name(&result), "Rose");

        let names: Vec<&str> = result
            .alternatives
            .iter()
            .map(|c| c.record_ref.name.as_str())
            .collect();
        // Rosy and Rosa tie on score and length; the earlier row wins the last slot
        assert_eq!(names, vec!["Rosea", "Rosie", "Rosy"]);
        assert_eq!(result.alternatives[0].method, MatchMethod::Substring);
        assert_eq!(result.alternatives[1].method, MatchMethod::Fuzzy);
        assert!(result.alternatives.iter().all(|c| c.score > 0.5));
    }

    #[test]
    fn test_near_miss_is_suggested() {
        let candidates = plants(&["Basil"]);
        let result = run("Basel", &candidates);
        assert!(!result.found);
        assert_eq!(result.confidence, Confidence::None);

        let best = result.best.as_ref().unwrap();
        assert_eq!(best.method, MatchMethod::Fuzzy);
        assert!(best.score > 0.5 && best.score < 0.6);
        assert_eq!(result.alternatives, vec![best.clone()]);
    }

    #[test]
    fn test_near_misses_fill_alternatives_best_first() {
        let candidates = plants(&["Mint", "Basil", "Bagel"]);
        let result = run("Basel", &candidates);
        assert!(!result.found);
        let names: Vec<&str> = result
            .alternatives
            .iter()
            .map(|c| c.record_ref.name.as_str())
            .collect();
        assert_eq!(names, vec!["Basil", "Bagel"]);
    }

    #[test]
    fn test_tie_prefers_shorter_name() {
        let candidates = plants(&["Red Sunflower", "Red Tulip"]);
        let result = run("Red Rose", &candidates);
        assert!(!result.found);
        let best = result.best.as_ref().unwrap();
        assert_eq!(best.record_ref.name, "Red Tulip");
        assert_eq!(best.method, MatchMethod::WordOverlap);
    }

    #[test]
    fn test_word_overlap_scoring() {
        let candidates = plants(&["Sweet Basil Genovese", "Basil Thai"]);
        let ranked = rank("Sweet Basil", &candidates, &fields(), &ResolverConfig::default());
        assert_eq!(ranked[0].record_ref.name, "Sweet Basil Genovese");
        assert_eq!(ranked[0].method, MatchMethod::WordOverlap);
        assert!((ranked[0].score - 0.8 * 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_substring_scoring() {
        let candidates = plants(&["Primrose"]);
        let ranked = rank("rose", &candidates, &fields(), &ResolverConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].method, MatchMethod::Substring);
        assert!((ranked[0].score - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_bands() {
        let config = ResolverConfig::default();
        assert_eq!(config.confidence(0.95), Confidence::High);
        assert_eq!(config.confidence(0.9), Confidence::High);
        assert_eq!(config.confidence(0.75), Confidence::Medium);
        assert_eq!(config.confidence(0.65), Confidence::Low);
        assert_eq!(config.confidence(0.3), Confidence::None);
    }

    #[test]
    fn test_records_without_names_are_skipped() {
        let candidates = vec![
            Record::new(0).with("Plant ID", "1"),
            Record::new(1).with("Plant ID", "2").with("Plant Name", "Lavender"),
        ];
        let result = run("lavendar", &candidates);
        assert!(result.found);
        assert_eq!(best_name(&result), "Lavender");
        assert_eq!(result.best.unwrap().method, MatchMethod::Fuzzy);
    }

    #[test]
    fn test_deterministic() {
        let candidates = plants(&["Rosy", "Rose", "Rosa", "Rosie", "Rosea", "Tomato"]);
        let first = serde_json::to_string(&run("Roses", &candidates)).unwrap();
        let second = serde_json::to_string(&run("Roses", &candidates)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_input() {
        let config = ResolverConfig::default();
        assert_eq!(
            resolve("rose", &[], &fields(), &config),
            Err(ResolveError::EmptySnapshot)
        );
        assert_eq!(
            resolve("   ", &plants(&["Rose"]), &fields(), &config),
            Err(ResolveError::EmptyIdentifier)
        );
        assert!(matches!(
            resolve("rose", &plants(&["Rose"]), &FieldRef::new("Plant ID", " "), &config),
            Err(ResolveError::InvalidFieldRef(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = ResolverConfig::from_json_str(r#"{"accept_threshold": 0.5}"#).unwrap();
        assert_eq!(config.accept_threshold, 0.5);
        assert_eq!(config.substring_weight, 0.9);

        assert!(matches!(
            ResolverConfig::from_json_str(r#"{"fuzzy_weight": 1.5}"#),
            Err(ResolveError::InvalidConfig(_))
        ));
        assert!(matches!(
            ResolverConfig::from_json_str(r#"{"medium_confidence": 0.95}"#),
            Err(ResolveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_lower_threshold_accepts_more() {
        let candidates = plants(&["Cherry Tomato"]);
        let strict = run("Tomatoes", &candidates);
        assert!(!strict.found);

        let config = ResolverConfig {
            accept_threshold: 0.4,
            ..Default::default()
        };
        let lenient = resolve("Tomatoes", &candidates, &fields(), &config).unwrap();
        assert!(lenient.found);
        assert_eq!(lenient.confidence, Confidence::Low);
    }
}
