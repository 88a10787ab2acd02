//! Agent identity descriptor.

use std::sync::Arc;

use crate::agent::callbacks::AgentCallbacks;

/// Derive a stable agent id from a display name.
///
/// Non-alphabetic characters are stripped (hyphens survive), whitespace
/// runs collapse to a single hyphen, and the result is lowercased.
/// `"Billing Agent"` becomes `"billing-agent"`.
pub fn derive_id_from_name(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                id.push('-');
                in_whitespace = true;
            }
        } else if ch.is_ascii_alphabetic() || ch == '-' {
            id.push(ch.to_ascii_lowercase());
            in_whitespace = false;
        } else {
            in_whitespace = false;
        }
    }

    id
}

/// Identity and behavior descriptor for an agent.
///
/// Immutable after agent construction. The id is either supplied
/// explicitly via [`with_id`](AgentOptions::with_id) or derived
/// deterministically from the name.
#[derive(Clone)]
pub struct AgentOptions {
    /// Display name (required).
    pub name: String,
    /// Capability description shown to the classifier.
    pub description: String,
    /// Stable registry key.
    pub id: String,
    /// Optional deployment region hint.
    pub region: Option<String>,
    /// Whether conversations should be persisted by the owning service.
    pub save_chat: bool,
    /// Lifecycle callback sink; `None` means no notifications.
    pub callbacks: Option<Arc<dyn AgentCallbacks>>,
    /// JSON schema the agent's responses should be coerced into.
    pub structured_output: Option<serde_json::Value>,
}

impl AgentOptions {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let id = derive_id_from_name(&name);
        Self {
            name,
            description: description.into(),
            id,
            region: None,
            save_chat: true,
            callbacks: None,
            structured_output: None,
        }
    }

    /// Override the derived id with an explicit one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_save_chat(mut self, save_chat: bool) -> Self {
        self.save_chat = save_chat;
        self
    }

    pub fn with_callbacks(mut self, callbacks: Arc<dyn AgentCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Declare a structured-output schema for this agent's responses.
    pub fn with_structured_output(mut self, schema: serde_json::Value) -> Self {
        self.structured_output = Some(schema);
        self
    }
}

impl std::fmt::Debug for AgentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentOptions")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("id", &self.id)
            .field("region", &self.region)
            .field("save_chat", &self.save_chat)
            .field("callbacks", &self.callbacks.as_ref().map(|_| "<sink>"))
            .field("structured_output", &self.structured_output)
            .finish()
    }
}
