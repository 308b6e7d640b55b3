//! The tool-call engine interface.
//!
//! An engine owns one parsing dialect: it turns a raw model response into
//! prose plus structured tool invocations. Engines declare which tool sets
//! they understand through a capability predicate and compete for selection
//! through a static priority (see [`crate::registry::EngineRegistry`]).

use agentkeel_core::model::ModelResponse;
use agentkeel_core::tool::{ToolCall, ToolDefinition};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by engine predicates and parsers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The capability predicate could not be evaluated.
    #[error("capability check failed: {0}")]
    Capability(String),

    /// Model output claimed a tool call the engine could not make sense of.
    #[error("malformed tool call: {0}")]
    MalformedToolCall(String),
}

/// What an engine extracted from one model response.
#[derive(Debug, Clone, Default)]
pub struct ParsedOutput {
    /// Prose left over after tool-call extraction.
    pub text: String,

    /// Reasoning content, if the model exposed any.
    pub reasoning: Option<String>,

    /// Structured tool invocations, in the order they appeared.
    pub tool_calls: Vec<ToolCall>,
}

impl ParsedOutput {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// One parsing dialect plus the routing metadata the registry needs.
pub trait ToolCallEngine: Send + Sync {
    /// Unique engine name; re-registering a name replaces the engine.
    fn name(&self) -> &str;

    /// Static rank; the registry prefers higher values among capable engines.
    fn priority(&self) -> i32;

    /// Whether this engine's dialect fits the offered tool set.
    ///
    /// Must be pure: same tools, same answer, no side effects.
    fn can_handle(&self, tools: &[ToolDefinition]) -> Result<bool, EngineError>;

    /// Extract prose and tool calls from a complete model response.
    fn parse(&self, response: &ModelResponse) -> Result<ParsedOutput, EngineError>;
}

/// True when any tool name or description mentions any vocabulary word.
///
/// Case-insensitive substring membership. Deliberately heuristic so routing
/// stays fast and explainable rather than exhaustively classified.
pub fn mentions_vocabulary(tools: &[ToolDefinition], vocabulary: &[&str]) -> bool {
    tools.iter().any(|tool| {
        let name = tool.name.to_lowercase();
        let description = tool.description.to_lowercase();
        vocabulary
            .iter()
            .any(|word| name.contains(word) || description.contains(word))
    })
}

/// Correlation id for a call extracted from free text, where the model
/// supplied none of its own.
pub(crate) fn fresh_call_id() -> String {
    format!("call_{}", Uuid::new_v4())
}
