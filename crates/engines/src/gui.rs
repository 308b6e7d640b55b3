//! Engine for GUI-automation tool sets.
//!
//! Models driving browser or desktop automation in this dialect narrate
//! their work as prose and mark each invocation on its own line:
//!
//! ```text
//! I'll capture the page before clicking anything.
//! Action: browser_screenshot({"full_page": true})
//! ```
//!
//! Everything that is not an `Action:` line is kept as prose.

use agentkeel_core::model::ModelResponse;
use agentkeel_core::tool::{ToolCall, ToolDefinition};

use crate::engine::{
    fresh_call_id, mentions_vocabulary, EngineError, ParsedOutput, ToolCallEngine,
};

const GUI_VOCABULARY: &[&str] = &["screenshot", "click", "scroll", "type"];

/// Parses the line-based `Action: name(arguments)` dialect.
pub struct GuiEngine;

impl ToolCallEngine for GuiEngine {
    fn name(&self) -> &str {
        "gui"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn can_handle(&self, tools: &[ToolDefinition]) -> Result<bool, EngineError> {
        Ok(mentions_vocabulary(tools, GUI_VOCABULARY))
    }

    fn parse(&self, response: &ModelResponse) -> Result<ParsedOutput, EngineError> {
        // Calls the provider already parsed natively come first.
        let mut tool_calls = response.tool_calls.clone();
        let mut prose = Vec::new();

        for line in response.content.lines() {
            match line.trim().strip_prefix("Action:") {
                Some(expression) => tool_calls.push(parse_action(expression.trim())?),
                None => prose.push(line),
            }
        }

        Ok(ParsedOutput {
            text: prose.join("\n").trim().to_string(),
            reasoning: response.reasoning.clone(),
            tool_calls,
        })
    }
}

/// Parse one `name(arguments)` expression. Arguments are a JSON object;
/// empty parens mean no arguments.
fn parse_action(expression: &str) -> Result<ToolCall, EngineError> {
    let open = expression.find('(').ok_or_else(|| {
        EngineError::MalformedToolCall(format!("missing '(' in action: {expression}"))
    })?;
    let close = expression.rfind(')').filter(|close| *close > open).ok_or_else(|| {
        EngineError::MalformedToolCall(format!("missing ')' in action: {expression}"))
    })?;

    let name = expression[..open].trim();
    if name.is_empty() {
        return Err(EngineError::MalformedToolCall(format!(
            "missing tool name in action: {expression}"
        )));
    }

    let raw_arguments = expression[open + 1..close].trim();
    let arguments = if raw_arguments.is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(raw_arguments).map_err(|error| {
            EngineError::MalformedToolCall(format!(
                "arguments for '{name}' are not valid JSON: {error}"
            ))
        })?
    };

    Ok(ToolCall {
        id: fresh_call_id(),
        name: name.to_string(),
        arguments,
    })
}
