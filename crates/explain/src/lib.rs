//! Caller-facing interpretation of resolution results.
//!
//! The resolver only reports scores. This crate turns a
//! `ResolutionResult` into the outcome a handler acts on (a match,
//! "did you mean", not found, or ambiguous) and into human-readable text.

use gardenkeep_model::{Confidence, MatchCandidate, MatchMethod, ResolutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// How a handler treats two candidates with the same best score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Take the resolver's deterministic pick
    #[default]
    BestEffort,
    /// Refuse to pick between tied candidates
    RejectTies,
}

/// A "did you mean" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub row: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub score: f32,
    pub method: MatchMethod,
}

impl From<&MatchCandidate> for Suggestion {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            name: candidate.record_ref.name.clone(),
            row: candidate.record_ref.row,
            id: candidate.record_ref.id.clone(),
            score: candidate.score,
            method: candidate.method,
        }
    }
}

/// Lookup failures a handler reports to its caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("No record matches '{identifier}'")]
    NotFound { identifier: String },

    #[error("No record matches '{identifier}'; did you mean {}?", quoted(suggestions))]
    SuggestionAvailable {
        identifier: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("'{identifier}' is ambiguous between {}", quoted(candidates))]
    Ambiguous {
        identifier: String,
        candidates: Vec<Suggestion>,
    },
}

fn quoted(suggestions: &[Suggestion]) -> String {
    suggestions
        .iter()
        .map(|s| format!("'{}'", s.name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl LookupError {
    /// HTTP status the API layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::SuggestionAvailable { .. } => 404,
            Self::Ambiguous { .. } => 409,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::SuggestionAvailable { .. } => "suggestion_available",
            Self::Ambiguous { .. } => "ambiguous_identifier",
        }
    }

    /// JSON body for the error response.
    pub fn to_payload(&self) -> Value {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        match self {
            Self::SuggestionAvailable { suggestions, .. } => {
                body["suggestions"] = json!(suggestions);
            }
            Self::Ambiguous { candidates, .. } => {
                body["candidates"] = json!(candidates);
            }
            Self::NotFound { .. } => {}
        }
        body
    }
}

/// Turn a resolution result into a single match or a lookup error.
///
/// An unaccepted result becomes `SuggestionAvailable` when the resolver
/// produced alternatives (for a rejected best these already include it,
/// closest first) and `NotFound` otherwise.
pub fn decide(
    identifier: &str,
    result: &ResolutionResult,
    policy: AmbiguityPolicy,
) -> Result<MatchCandidate, LookupError> {
    let Some(best) = result.best.as_ref().filter(|_| result.found) else {
        if result.alternatives.is_empty() {
            return Err(LookupError::NotFound {
                identifier: identifier.to_string(),
            });
        }
        let suggestions = result.alternatives.iter().map(Suggestion::from).collect();
        return Err(LookupError::SuggestionAvailable {
            identifier: identifier.to_string(),
            suggestions,
        });
    };

    if policy == AmbiguityPolicy::RejectTies && result.ties().next().is_some() {
        let candidates = std::iter::once(best)
            .chain(result.ties())
            .map(Suggestion::from)
            .collect();
        return Err(LookupError::Ambiguous {
            identifier: identifier.to_string(),
            candidates,
        });
    }

    Ok(best.clone())
}

/// A structured explanation of a resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation
    pub detail: String,

    pub confidence: Confidence,

    /// Candidates the explanation refers to, best first
    pub evidence: Vec<Suggestion>,
}

/// Explain how an identifier was (or was not) resolved.
pub fn explain_result(result: &ResolutionResult, identifier: &str) -> Explanation {
    let accepted = result.best.iter().filter(|_| result.found);
    let evidence: Vec<Suggestion> = accepted
        .chain(result.alternatives.iter())
        .map(Suggestion::from)
        .collect();

    let (summary, detail) = match (&result.best, result.found) {
        (Some(best), true) => (
            format!("Matched '{}'", best.record_ref.name),
            format!(
                "'{}' resolved to '{}' (row {}) by {} with score {:.2}.",
                identifier,
                best.record_ref.name,
                best.record_ref.row,
                method_label(best.method),
                best.score
            ),
        ),
        (Some(best), false) => (
            "No confident match".to_string(),
            format!(
                "The closest record to '{}' is '{}' with score {:.2}, \
                 below the acceptance threshold.",
                identifier, best.record_ref.name, best.score
            ),
        ),
        (None, _) => (
            "No match".to_string(),
            format!("No record name resembles '{}'.", identifier),
        ),
    };

    Explanation {
        summary,
        detail,
        confidence: result.confidence,
        evidence,
    }
}

/// Human-readable label for a match method.
pub fn method_label(method: MatchMethod) -> &'static str {
    match method {
        MatchMethod::Exact => "exact match",
        MatchMethod::Substring => "partial name",
        MatchMethod::WordOverlap => "shared words",
        MatchMethod::Fuzzy => "similar spelling",
    }
}

/// One-line summary of a resolution result.
pub fn summarize(result: &ResolutionResult) -> String {
    match (&result.best, result.found) {
        (Some(best), true) => format!(
            "{} CONFIDENCE: {} ({}, {:.2})",
            result.confidence.as_str().to_uppercase(),
            best.record_ref.name,
            method_label(best.method),
            best.score
        ),
        _ if !result.alternatives.is_empty() => {
            let names: Vec<_> = result
                .alternatives
                .iter()
                .map(|c| c.record_ref.name.as_str())
                .collect();
            format!("NOT FOUND: did you mean {}?", names.join(", "))
        }
        _ => "NOT FOUND".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardenkeep_model::RecordRef;
    use pretty_assertions::assert_eq;

    fn candidate(row: usize, name: &str, score: f32, method: MatchMethod) -> MatchCandidate {
        MatchCandidate {
            record_ref: RecordRef {
                row,
                id: Some((row + 1).to_string()),
                name: name.to_string(),
            },
            score,
            method,
        }
    }

    fn accepted() -> ResolutionResult {
        ResolutionResult {
            found: true,
            best: Some(candidate(0, "Rose", 0.9, MatchMethod::Substring)),
            confidence: Confidence::High,
            alternatives: vec![candidate(4, "Rosea", 0.72, MatchMethod::Substring)],
        }
    }

    #[test]
    fn test_decide_accepts_best() {
        let best = decide("Roses", &accepted(), AmbiguityPolicy::RejectTies).unwrap();
        assert_eq!(best.record_ref.name, "Rose");
    }

    #[test]
    fn test_decide_not_found() {
        let err = decide("Xyzzy", &ResolutionResult::not_found(), AmbiguityPolicy::BestEffort)
            .unwrap_err();
        assert_eq!(
            err,
            LookupError::NotFound {
                identifier: "Xyzzy".to_string()
            }
        );
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "No record matches 'Xyzzy'");
    }

    #[test]
    fn test_decide_weak_best_without_alternatives_is_not_found() {
        let result = ResolutionResult {
            found: false,
            best: Some(candidate(1, "Red Tulip", 0.27, MatchMethod::WordOverlap)),
            confidence: Confidence::None,
            alternatives: vec![],
        };
        let err = decide("Red Rose", &result, AmbiguityPolicy::BestEffort).unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
    }

    #[test]
    fn test_decide_suggestions() {
        let result = ResolutionResult {
            found: false,
            best: Some(candidate(2, "Sweet Basil Genovese", 0.55, MatchMethod::WordOverlap)),
            confidence: Confidence::None,
            alternatives: vec![
                candidate(2, "Sweet Basil Genovese", 0.55, MatchMethod::WordOverlap),
                candidate(3, "Sweet Basil Purple", 0.53, MatchMethod::WordOverlap),
            ],
        };
        let err = decide("sweet basils", &result, AmbiguityPolicy::BestEffort).unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(
            err.to_string(),
            "No record matches 'sweet basils'; did you mean 'Sweet Basil Genovese', 'Sweet Basil Purple'?"
        );

        let payload = err.to_payload();
        assert_eq!(payload["error"], "suggestion_available");
        assert_eq!(payload["suggestions"][0]["name"], "Sweet Basil Genovese");
        assert_eq!(payload["suggestions"][1]["row"], 3);
    }

    #[test]
    fn test_reject_ties() {
        let result = ResolutionResult {
            found: true,
            best: Some(candidate(0, "Mint", 0.7, MatchMethod::Fuzzy)),
            confidence: Confidence::Medium,
            alternatives: vec![
                candidate(1, "Mist", 0.7, MatchMethod::Fuzzy),
                candidate(2, "Minty", 0.6, MatchMethod::Fuzzy),
            ],
        };

        let best = decide("Minst", &result, AmbiguityPolicy::BestEffort).unwrap();
        assert_eq!(best.record_ref.name, "Mint");

        let err = decide("Minst", &result, AmbiguityPolicy::RejectTies).unwrap_err();
        assert_eq!(err.status_code(), 409);
        match &err {
            LookupError::Ambiguous { candidates, .. } => {
                let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["Mint", "Mist"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert_eq!(err.to_payload()["error"], "ambiguous_identifier");
    }

    #[test]
    fn test_explain_result() {
        let explanation = explain_result(&accepted(), "Roses");
        assert_eq!(explanation.summary, "Matched 'Rose'");
        assert!(explanation.detail.contains("partial name"));
        assert_eq!(explanation.confidence, Confidence::High);
        assert_eq!(explanation.evidence.len(), 2);

        let none = explain_result(&ResolutionResult::not_found(), "Xyzzy");
        assert_eq!(none.summary, "No match");
        assert!(none.evidence.is_empty());
    }

    #[test]
    fn test_resolved_near_miss_offers_suggestion() {
        use gardenkeep_model::{EntityKind, FieldRef, Record};
        use gardenkeep_resolve::{resolve, ResolverConfig};

        let records = vec![Record::new(0)
            .with("Plant ID", "1")
            .with("Plant Name", "Basil")];
        let result = resolve(
            "Basel",
            &records,
            &FieldRef::for_kind(EntityKind::Plant),
            &ResolverConfig::default(),
        )
        .unwrap();

        let err = decide("Basel", &result, AmbiguityPolicy::BestEffort).unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(
            err.to_string(),
            "No record matches 'Basel'; did you mean 'Basil'?"
        );
        assert_eq!(err.to_payload()["suggestions"][0]["name"], "Basil");
        assert_eq!(summarize(&result), "NOT FOUND: did you mean Basil?");
        assert_eq!(explain_result(&result, "Basel").evidence.len(), 1);
    }

    #[test]
    fn test_summarize() {
        assert_eq!(
            summarize(&accepted()),
            "HIGH CONFIDENCE: Rose (partial name, 0.90)"
        );
        assert_eq!(summarize(&ResolutionResult::not_found()), "NOT FOUND");
    }
}
