//! Application layer for maestro
//!
//! Orchestration logic built on the domain layer: the agent capability
//! contract and its strategy implementations, the agent registry, the
//! ports consumed from external adapters, the retry policies, and the
//! streaming/blocking adapters.
//!
//! # Strategies
//!
//! - [`PlanningAgent`] — plan, execute steps in order, summarize.
//!   Failures propagate.
//! - [`RouterAgent`] — classify, delegate above the confidence gate,
//!   judge, refine. Failures degrade to an apology.
//! - [`ParallelAgent`] — fan out to the whole registry, integrate the
//!   labeled outputs. Failures degrade to an apology.
//! - [`ReflectionAgent`] — generate, critique, revise until the critic
//!   approves. Failures of the generator propagate.
//! - [`DirectAgent`] — one completion, the leaf the other strategies
//!   delegate to.

pub mod agents;
pub mod bridge;
pub mod config;
pub mod ports;
pub mod registry;
pub mod retry;
pub mod streaming;

#[cfg(test)]
pub(crate) mod test_support;

pub use agents::{
    Agent, AgentCore, AgentError, DirectAgent, ParallelAgent, PlanningAgent, ReflectionAgent,
    RouterAgent,
};
pub use bridge::{BlockingBridge, BridgeError, run_blocking};
pub use config::BehaviorConfig;
pub use ports::llm_gateway::{GatewayError, LlmGateway};
pub use ports::tool_executor::ToolExecutorPort;
pub use registry::AgentRegistry;
pub use streaming::{
    BlockingTokenStream, DEFAULT_CHUNK_SIZE, DETAILED_CHUNK_SIZE, TokenStream,
};
