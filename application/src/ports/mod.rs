//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts the orchestration core consumes: the LLM
//! capability and the tool capability. Implementations live outside this
//! crate.

pub mod llm_gateway;
pub mod tool_executor;
