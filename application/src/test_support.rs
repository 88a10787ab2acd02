//! Scripted stand-ins for the ports and the agent contract, shared by
//! the colocated test modules.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use maestro_domain::{
    AgentCallbacks, AgentOptions, Message, ToolDefinition, ToolError, chunk_text,
};

use crate::agents::{Agent, AgentError};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::streaming::TokenStream;

/// A gateway that replays scripted responses in order and records every
/// prompt it receives. An exhausted script fails the call.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<String>) -> Self {
        Self::from_script(responses.into_iter().map(Ok).collect())
    }

    /// Script individual outcomes: `Ok` replays a response, `Err` fails
    /// that call with a request error.
    pub fn from_script(script: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmGateway for ScriptedLlm {
    async fn achat(&self, query: &str, _history: &[Message]) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(query.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GatewayError::RequestFailed(message)),
            None => Err(GatewayError::Other("script exhausted".to_string())),
        }
    }
}

/// A gateway that always fails with a transient error.
pub struct FailingLlm;

#[async_trait]
impl LlmGateway for FailingLlm {
    async fn achat(&self, _query: &str, _history: &[Message]) -> Result<String, GatewayError> {
        Err(GatewayError::ConnectionError("connection refused".to_string()))
    }
}

/// A registry member with a fixed answer, or a fixed failure.
pub struct StubAgent {
    options: AgentOptions,
    reply: Option<String>,
}

impl StubAgent {
    pub fn answering(
        name: impl Into<String>,
        description: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            options: AgentOptions::new(name, description),
            reply: Some(reply.into()),
        }
    }

    pub fn failing(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            options: AgentOptions::new(name, description),
            reply: None,
        }
    }
}

#[async_trait]
impl Agent for StubAgent {
    fn options(&self) -> &AgentOptions {
        &self.options
    }

    async fn achat(&self, _query: &str, _history: &[Message]) -> Result<String, AgentError> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(AgentError::Gateway(GatewayError::RequestFailed(
                "stubbed failure".to_string(),
            ))),
        }
    }

    async fn astream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, AgentError> {
        let text = self.achat(query, history).await?;
        Ok(TokenStream::from_chunks(chunk_text(&text, 5)))
    }
}

/// A tool that records its invocations and returns a fixed value, or a
/// fixed error.
pub struct StubTool {
    definition: ToolDefinition,
    outcome: Result<serde_json::Value, (String, String)>,
    invocations: Mutex<Vec<serde_json::Value>>,
}

impl StubTool {
    pub fn returning(
        name: impl Into<String>,
        description: impl Into<String>,
        output: serde_json::Value,
    ) -> Self {
        Self {
            definition: ToolDefinition::new(
                name,
                description,
                serde_json::json!({"type": "object"}),
            ),
            outcome: Ok(output),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(
        name: impl Into<String>,
        description: impl Into<String>,
        error: ToolError,
    ) -> Self {
        let (tool, message) = match error {
            ToolError::InvalidArguments { tool, message } => (tool, message),
            ToolError::ExecutionFailed { tool, message } => (tool, message),
        };
        Self {
            definition: ToolDefinition::new(
                name,
                description,
                serde_json::json!({"type": "object"}),
            ),
            outcome: Err((tool, message)),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Argument objects received so far, in call order.
    pub fn invocations(&self) -> Vec<serde_json::Value> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutorPort for StubTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        self.invocations.lock().unwrap().push(arguments);
        match &self.outcome {
            Ok(output) => Ok(output.clone()),
            Err((tool, message)) => Err(ToolError::execution_failed(tool, message)),
        }
    }
}

/// A callback sink that records lifecycle events as `kind:agent` lines.
pub struct RecordingCallbacks {
    events: Mutex<Vec<String>>,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl AgentCallbacks for RecordingCallbacks {
    fn on_new_token(&self, token: &str) {
        self.events.lock().unwrap().push(format!("token:{token}"));
    }

    fn on_agent_start(&self, agent_name: &str) {
        self.events.lock().unwrap().push(format!("start:{agent_name}"));
    }

    fn on_agent_end(&self, agent_name: &str) {
        self.events.lock().unwrap().push(format!("end:{agent_name}"));
    }
}
