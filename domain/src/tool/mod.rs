//! Tool domain types.

pub mod entities;
pub mod value_objects;

pub use entities::ToolDefinition;
pub use value_objects::ToolError;
