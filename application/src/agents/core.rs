//! Shared agent execution machinery.
//!
//! `AgentCore` holds everything every strategy needs: the LLM gateway,
//! the composed system prompt, the tool map, the callback sink and the
//! pacing configuration. Strategies embed a core instead of inheriting
//! from a base type.

use std::collections::HashMap;
use std::sync::Arc;

use maestro_domain::{
    AgentCallbacks, AgentOptions, Message, NoCallbacks, PromptTemplate, extract_json_object,
};
use tracing::{debug, warn};

use crate::agents::AgentError;
use crate::config::BehaviorConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::retry::{retry_on_json_error, retry_transient};

/// Sentinel rendered into prompts when the agent has no tools.
const NO_TOOLS: &str = "No tools are available. Respond based on your general knowledge only.";
/// Sentinel rendered into prompts when no output schema is declared.
const NO_SCHEMA: &str = "[No specific output schema].";

/// Shared machinery embedded by every agent.
#[derive(Clone)]
pub struct AgentCore {
    llm: Arc<dyn LlmGateway>,
    options: AgentOptions,
    system_prompt: Option<String>,
    tools: HashMap<String, Arc<dyn ToolExecutorPort>>,
    tool_order: Vec<String>,
    callbacks: Arc<dyn AgentCallbacks>,
    config: BehaviorConfig,
}

impl AgentCore {
    pub fn new(llm: Arc<dyn LlmGateway>, options: AgentOptions) -> Self {
        let callbacks = options
            .callbacks
            .clone()
            .unwrap_or_else(|| Arc::new(NoCallbacks));
        Self {
            llm,
            options,
            system_prompt: None,
            tools: HashMap::new(),
            tool_order: Vec::new(),
            callbacks,
            config: BehaviorConfig::default(),
        }
    }

    /// Set the system prompt prepended to every conversation.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_config(mut self, config: BehaviorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a tool. Last registration under a name wins.
    pub fn register_tool(&mut self, tool: Arc<dyn ToolExecutorPort>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "replacing previously registered tool");
        } else {
            self.tool_order.push(name);
        }
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn callbacks(&self) -> &Arc<dyn AgentCallbacks> {
        &self.callbacks
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Registered tool names, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_order.clone()
    }

    pub fn has_tools(&self) -> bool {
        !self.tool_order.is_empty()
    }

    /// Render every tool's name, description and parameter schema for
    /// prompt embedding.
    pub fn format_tool_signatures(&self) -> String {
        if self.tool_order.is_empty() {
            return NO_TOOLS.to_string();
        }
        self.tool_order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let def = tool.definition();
                format!(
                    "Tool: {}\nDescription: {}\nParameters:\n{}\n",
                    def.name,
                    def.description,
                    def.parameters_pretty()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The declared output schema as pretty JSON, or the no-schema
    /// sentinel.
    pub fn output_schema_text(&self) -> String {
        match &self.options.structured_output {
            Some(schema) => serde_json::to_string_pretty(schema)
                .unwrap_or_else(|_| schema.to_string()),
            None => NO_SCHEMA.to_string(),
        }
    }

    /// Prepend the system prompt (when set) to the conversation history.
    pub fn with_system(&self, history: &[Message]) -> Vec<Message> {
        match &self.system_prompt {
            Some(prompt) => {
                let mut messages = Vec::with_capacity(history.len() + 1);
                messages.push(Message::system(prompt.clone()));
                messages.extend_from_slice(history);
                messages
            }
            None => history.to_vec(),
        }
    }

    /// Sleep between visible phases when pacing is enabled.
    pub async fn pace(&self) {
        if let Some(delay) = self.config.phase_delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// One LLM completion with the system prompt applied. No retry; call
    /// sites wrap in the policy the operation needs.
    pub async fn completion(
        &self,
        prompt: &str,
        history: &[Message],
    ) -> Result<String, AgentError> {
        let messages = self.with_system(history);
        self.completion_raw(prompt, &messages).await
    }

    /// One LLM completion with the caller's messages as-is, no system
    /// prompt injection. For strategies that manage their own system
    /// turns.
    pub async fn completion_raw(
        &self,
        prompt: &str,
        messages: &[Message],
    ) -> Result<String, AgentError> {
        Ok(self.llm.achat(prompt, messages).await?)
    }

    /// Completion wrapped in the transient retry policy.
    pub async fn completion_with_retry(
        &self,
        what: &str,
        prompt: &str,
        history: &[Message],
    ) -> Result<String, AgentError> {
        retry_transient(what, || self.completion(prompt, history)).await
    }

    /// Answer the query directly, bypassing orchestration. Used by the
    /// low-confidence and empty-registry fallbacks.
    pub async fn direct_answer(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<String, AgentError> {
        let prompt = PromptTemplate::direct_answer(query);
        self.completion_with_retry("direct answer", &prompt, history)
            .await
    }

    /// Execute a named tool for a step: synthesize arguments through the
    /// LLM, parse them, invoke the tool.
    ///
    /// `required = false` converts every failure (unknown tool, bad
    /// arguments, invocation error) into `Ok(None)`; `required = true`
    /// propagates it.
    pub async fn execute_tool(
        &self,
        step_description: &str,
        tool_name: &str,
        required: bool,
    ) -> Result<Option<String>, AgentError> {
        let result = self.try_execute_tool(step_description, tool_name).await;
        match result {
            Ok(output) => Ok(Some(output)),
            Err(err) if required => Err(err),
            Err(err) => {
                warn!(tool = tool_name, error = %err, "optional tool failed, continuing");
                Ok(None)
            }
        }
    }

    async fn try_execute_tool(
        &self,
        step_description: &str,
        tool_name: &str,
    ) -> Result<String, AgentError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| AgentError::UnknownTool(tool_name.to_string()))?;
        let def = tool.definition();
        let prompt = PromptTemplate::tool_arguments(
            step_description,
            &def.name,
            &def.description,
            &def.parameters_pretty(),
        );

        let arguments = retry_on_json_error("tool arguments", || async {
            let response = self.completion(&prompt, &[]).await?;
            let json = extract_json_object(&response).ok_or_else(|| {
                AgentError::MalformedJson(format!("no JSON object in: {response}"))
            })?;
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| AgentError::MalformedJson(e.to_string()))?;
            value
                .get("arguments")
                .cloned()
                .ok_or_else(|| AgentError::MalformedJson("missing 'arguments' key".to_string()))
        })
        .await?;

        debug!(tool = tool_name, %arguments, "invoking tool");
        let output = tool.invoke(arguments).await?;
        Ok(render_tool_output(&output))
    }

    /// Coerce raw text into the declared output schema.
    ///
    /// With a schema: a schema-guided completion pass under the parse
    /// retry policy; exhaustion degrades to the raw text. Without a
    /// schema the text passes through unchanged. Callers always receive
    /// some text.
    pub async fn parse_structured_output(&self, raw: &str, history: &[Message]) -> String {
        match self.structured_pass(raw, history).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "structured output pass failed, returning raw text");
                raw.to_string()
            }
        }
    }

    async fn structured_pass(&self, raw: &str, history: &[Message]) -> Result<String, AgentError> {
        let Some(schema) = &self.options.structured_output else {
            return Ok(raw.to_string());
        };
        let schema_text = serde_json::to_string_pretty(schema)
            .unwrap_or_else(|_| schema.to_string());
        let prompt = PromptTemplate::structured_output(raw, &schema_text);

        retry_on_json_error("structured output", || async {
            let response = self.completion(&prompt, history).await?;
            let json = extract_json_object(&response).ok_or_else(|| {
                AgentError::MalformedJson(format!("no JSON object in: {response}"))
            })?;
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| AgentError::MalformedJson(e.to_string()))?;
            serde_json::to_string_pretty(&value)
                .map_err(|e| AgentError::MalformedJson(e.to_string()))
        })
        .await
    }
}

/// Tool outputs are JSON values; strings render bare, everything else as
/// compact JSON.
fn render_tool_output(output: &serde_json::Value) -> String {
    match output.as_str() {
        Some(s) => s.to_string(),
        None => output.to_string(),
    }
}
