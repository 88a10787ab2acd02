//! Judge output parsing for delegated responses.

use serde::{Deserialize, Serialize};

use crate::util::extract_json_object;

/// The judge's quality verdict on a delegated answer.
///
/// Produced at most once per routing run. When the judge's output cannot
/// be parsed, [`ValidationResult::accepting_default`] is used instead —
/// a deliberate bias toward not blocking the user on judge failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Quality rating in `[0, 1]`.
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub needs_refinement: bool,
    #[serde(default)]
    pub refinement_suggestions: String,
}

impl ValidationResult {
    /// The accepting fallback used when the judge's output is unusable:
    /// `is_valid = true`, `score = 0.75`, `needs_refinement = false`.
    pub fn accepting_default(reasoning: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            score: 0.75,
            reasoning: reasoning.into(),
            needs_refinement: false,
            refinement_suggestions: String::new(),
        }
    }

    /// Refinement triggers only when the judge asked for it *and* the
    /// score falls strictly below the router's threshold.
    pub fn wants_refinement(&self, threshold: f64) -> bool {
        self.needs_refinement && self.score < threshold
    }
}

#[derive(Debug, Deserialize)]
struct RawValidation {
    #[serde(default = "default_is_valid")]
    is_valid: bool,
    #[serde(default = "default_score")]
    score: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    needs_refinement: bool,
    #[serde(default)]
    refinement_suggestions: String,
}

fn default_is_valid() -> bool {
    true
}

// A judge that omits the score is treated as fully satisfied, which
// disables the score-gated refinement path.
fn default_score() -> f64 {
    1.0
}

/// Parse a validation verdict from model response text.
///
/// Missing fields take lenient defaults; the score is clamped to `[0, 1]`.
/// Returns `None` when no JSON object can be parsed at all.
pub fn parse_validation(response: &str) -> Option<ValidationResult> {
    let json = extract_json_object(response)?;
    let raw: RawValidation = serde_json::from_str(&json).ok()?;

    Some(ValidationResult {
        is_valid: raw.is_valid,
        score: raw.score.clamp(0.0, 1.0),
        reasoning: raw.reasoning,
        needs_refinement: raw.needs_refinement,
        refinement_suggestions: raw.refinement_suggestions,
    })
}
