//! Tool boundary types — the shapes that cross between planner, engines,
//! and the external tool executor.
//!
//! Concrete tools (browser control, file I/O, shell) live outside this
//! workspace; the control plane only dispatches parsed calls to an opaque
//! [`ToolExecutor`] keyed by tool name and records the results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A tool definition exposed to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A structured request, parsed from model output, to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id shared with the matching `tool_result` event
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The tool execution boundary.
///
/// The session loop resolves tool calls against whatever implementation it
/// was handed; how tools are sandboxed or where they run is not this
/// crate's concern.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Definitions of every tool this executor can dispatch to.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Execute one parsed call, keyed by `call.name`.
    async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError>;
}
