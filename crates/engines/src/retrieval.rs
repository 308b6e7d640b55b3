//! Engine for retrieval and search tool sets.
//!
//! Models in this dialect embed tool calls as fenced JSON blocks inside
//! prose:
//!
//! ~~~text
//! Let me look that up.
//! ```json
//! {"tool": "web_search", "arguments": {"query": "rust 1.88 release notes"}}
//! ```
//! ~~~
//!
//! A fenced block that is not a tool call (no `tool`/`name` key, or not
//! valid JSON) stays in the prose untouched.

use agentkeel_core::model::ModelResponse;
use agentkeel_core::tool::{ToolCall, ToolDefinition};
use tracing::warn;

use crate::engine::{
    fresh_call_id, mentions_vocabulary, EngineError, ParsedOutput, ToolCallEngine,
};

const RETRIEVAL_VOCABULARY: &[&str] = &["search", "query", "retrieve"];

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Parses fenced JSON tool-call blocks out of prose.
pub struct RetrievalEngine;

impl ToolCallEngine for RetrievalEngine {
    fn name(&self) -> &str {
        "retrieval"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn can_handle(&self, tools: &[ToolDefinition]) -> Result<bool, EngineError> {
        Ok(mentions_vocabulary(tools, RETRIEVAL_VOCABULARY))
    }

    fn parse(&self, response: &ModelResponse) -> Result<ParsedOutput, EngineError> {
        let mut tool_calls = response.tool_calls.clone();
        let mut prose = String::new();
        let mut rest = response.content.as_str();

        while let Some(start) = rest.find(FENCE_OPEN) {
            let (before, fenced) = rest.split_at(start);
            prose.push_str(before);

            let body = &fenced[FENCE_OPEN.len()..];
            match body.find(FENCE_CLOSE) {
                Some(end) => {
                    match tool_call_from_block(body[..end].trim()) {
                        Some(call) => tool_calls.push(call),
                        // Not a call; keep the whole fence in prose.
                        None => prose.push_str(&fenced[..FENCE_OPEN.len() + end + FENCE_CLOSE.len()]),
                    }
                    rest = &body[end + FENCE_CLOSE.len()..];
                }
                None => {
                    // Unterminated fence; the tail is prose.
                    prose.push_str(fenced);
                    rest = "";
                }
            }
        }
        prose.push_str(rest);

        Ok(ParsedOutput {
            text: prose.trim().to_string(),
            reasoning: response.reasoning.clone(),
            tool_calls,
        })
    }
}

/// Interpret one fenced block as a tool call, accepting both `tool` and
/// `name` as the name key. Missing `arguments` means no arguments.
fn tool_call_from_block(block: &str) -> Option<ToolCall> {
    let value: serde_json::Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(error) => {
            warn!(error = %error, "Fenced json block did not parse; leaving it in prose");
            return None;
        }
    };

    let name = value
        .get("tool")
        .or_else(|| value.get("name"))?
        .as_str()?
        .to_string();
    let arguments = value
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    Some(ToolCall {
        id: fresh_call_id(),
        name,
        arguments,
    })
}
