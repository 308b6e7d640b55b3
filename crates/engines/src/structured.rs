//! Passthrough engine for models with native structured tool calling.

use agentkeel_core::model::ModelResponse;
use agentkeel_core::tool::ToolDefinition;

use crate::engine::{EngineError, ParsedOutput, ToolCallEngine};

/// The always-capable fallback engine.
///
/// Trusts the tool calls the model provider already parsed out of the wire
/// format and passes content through untouched. Registered implicitly by
/// [`crate::registry::EngineRegistry`] at priority 0 so resolution always
/// produces an engine.
pub struct StructuredEngine;

impl ToolCallEngine for StructuredEngine {
    fn name(&self) -> &str {
        "structured"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn can_handle(&self, _tools: &[ToolDefinition]) -> Result<bool, EngineError> {
        Ok(true)
    }

    fn parse(&self, response: &ModelResponse) -> Result<ParsedOutput, EngineError> {
        Ok(ParsedOutput {
            text: response.content.clone(),
            reasoning: response.reasoning.clone(),
            tool_calls: response.tool_calls.clone(),
        })
    }
}
