//! Domain layer for maestro
//!
//! This crate contains the core entities, value objects, parsers, and
//! prompt templates of the agent-orchestration engine. It has no
//! dependencies on the async runtime or any I/O concern.
//!
//! # Core Concepts
//!
//! ## Strategies
//!
//! Three orchestration strategies share this vocabulary:
//!
//! - **Planning**: an ordered [`ExecutionPlan`] of tool and non-tool steps
//! - **Routing**: a [`Classification`] gates delegation, a
//!   [`ValidationResult`] gates refinement
//! - **Parallel**: fan-out to every registered agent, then integration
//!
//! ## Lenient parsing
//!
//! LLM output is hostile input. Every parser here returns `Option` and the
//! application layer applies a named fallback policy (arbitrary-member
//! classification fallback, accepting validation default, raw-text
//! structured-output degradation) rather than surfacing a parse error.

pub mod agent;
pub mod plan;
pub mod prompt;
pub mod routing;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use agent::{
    callbacks::{AgentCallbacks, NoCallbacks},
    options::{AgentOptions, derive_id_from_name},
};
pub use plan::{
    entities::{ExecutionPlan, PlanContext, PlanStep},
    parser::{parse_plan, retain_known_tools},
};
pub use prompt::PromptTemplate;
pub use routing::{
    classification::{Classification, parse_classification},
    validation::{ValidationResult, parse_validation},
};
pub use session::entities::{Message, Role};
pub use tool::{entities::ToolDefinition, value_objects::ToolError};
pub use util::{chunk_text, extract_json_object};
