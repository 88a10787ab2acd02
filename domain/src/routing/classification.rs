//! Classifier output parsing.

use crate::util::extract_json_object;

/// The classifier's verdict: which agent should handle a query.
///
/// Produced once per routing run. Confidence is the classifier's
/// self-reported probability that the chosen agent is correct, clamped
/// defensively to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Registry id of the selected agent, if the classifier named one.
    pub selected_agent: Option<String>,
    /// Self-reported probability in `[0, 1]`.
    pub confidence: f64,
    /// Brief explanation from the classifier.
    pub reasoning: String,
}

/// Parse a classification from model response text.
///
/// Expects `{"selected_agent": "...", "confidence": 0.0, "reasoning": "..."}`.
/// Returns `None` when the response is not parseable or lacks a numeric
/// confidence; the caller applies the documented fallback policy.
pub fn parse_classification(response: &str) -> Option<Classification> {
    let json = extract_json_object(response)?;
    let value: serde_json::Value = serde_json::from_str(&json).ok()?;

    let confidence = value.get("confidence")?.as_f64()?.clamp(0.0, 1.0);
    let selected_agent = value
        .get("selected_agent")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let reasoning = value
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some(Classification {
        selected_agent,
        confidence,
        reasoning,
    })
}
