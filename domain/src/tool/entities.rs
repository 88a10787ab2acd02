//! Tool domain entities

use serde::{Deserialize, Serialize};

/// Definition of a tool an agent may invoke.
///
/// `parameters` is a JSON schema describing the argument object the tool
/// accepts; it is rendered into prompts verbatim so the LLM can
/// synthesize matching arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "kb_search").
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Pretty-printed parameter schema for prompt embedding.
    pub fn parameters_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.parameters)
            .unwrap_or_else(|_| self.parameters.to_string())
    }
}
