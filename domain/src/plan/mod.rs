//! Execution plans for the sequential planning strategy.

pub mod entities;
pub mod parser;

pub use entities::{ExecutionPlan, PlanContext, PlanStep};
pub use parser::{parse_plan, retain_known_tools};
