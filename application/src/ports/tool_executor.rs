//! Tool Executor port
//!
//! Defines the interface for the tool capability: a named, described,
//! schema-typed callable the core may invoke with JSON arguments.

use async_trait::async_trait;
use maestro_domain::{ToolDefinition, ToolError};

/// Port for a single invokable tool.
///
/// Implementations (adapters) live outside the orchestration core. The
/// core makes no exactly-once guarantee about side effects: a retried or
/// abandoned orchestration run may invoke a tool zero or multiple times.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// The tool's name, description, and JSON parameter schema.
    fn definition(&self) -> &ToolDefinition;

    /// Unique name used as the tool-map key.
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Invoke the tool with a JSON argument object.
    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}
