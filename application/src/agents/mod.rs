//! Agent capability contract and its strategy implementations.
//!
//! Every agent exposes the same four entry points: asynchronous
//! one-shot ([`Agent::achat`]) and streaming ([`Agent::astream_chat`])
//! forms, plus blocking wrappers built on the runtime bridge. The
//! strategies differ only in how they orchestrate the LLM, the tools and
//! the registry between those entry points.

use async_trait::async_trait;
use maestro_domain::{AgentOptions, Message, ToolError};
use thiserror::Error;

use crate::bridge::{BlockingBridge, BridgeError, run_blocking};
use crate::ports::llm_gateway::GatewayError;
use crate::streaming::{BlockingTokenStream, TokenStream};

pub mod core;
pub mod direct;
pub mod parallel;
pub mod planning;
pub mod reflection;
pub mod routing;

pub use self::core::AgentCore;
pub use direct::DirectAgent;
pub use parallel::ParallelAgent;
pub use planning::PlanningAgent;
pub use reflection::ReflectionAgent;
pub use routing::RouterAgent;

/// Errors surfaced by orchestration runs.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Malformed JSON in model response: {0}")]
    MalformedJson(String),

    #[error("Orchestration task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl AgentError {
    /// Whether this failure came from unparseable model JSON, the only
    /// class the parse retry policy will retry.
    pub fn is_json_error(&self) -> bool {
        matches!(self, Self::MalformedJson(_))
    }
}

/// The agent capability contract.
///
/// Implemented by the direct leaf agent and the three orchestration
/// strategies. Object-safe so the registry can hold `Arc<dyn Agent>`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Identity and behavior descriptor.
    fn options(&self) -> &AgentOptions;

    fn name(&self) -> &str {
        &self.options().name
    }

    fn id(&self) -> &str {
        &self.options().id
    }

    fn description(&self) -> &str {
        &self.options().description
    }

    /// Run the agent and return the complete final answer.
    async fn achat(&self, query: &str, history: &[Message]) -> Result<String, AgentError>;

    /// Run the agent and return the answer as a chunked token stream.
    async fn astream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, AgentError>;

    /// Blocking form of [`achat`](Agent::achat). Works with or without an
    /// ambient tokio runtime.
    fn chat(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        run_blocking(self.achat(query, history))?
    }

    /// Blocking form of [`astream_chat`](Agent::astream_chat). The
    /// returned iterator owns the bridge that drives the producer task.
    fn stream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<BlockingTokenStream, AgentError> {
        let bridge = BlockingBridge::acquire()?;
        let stream = bridge.block_on(self.astream_chat(query, history))?;
        Ok(BlockingTokenStream::new(bridge, stream))
    }
}
