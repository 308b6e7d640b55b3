//! Strategy that skips planning entirely.

use agentkeel_core::tool::ToolDefinition;

use crate::state::{PlannerStage, PlannerState};
use crate::strategy::{PlanningStrategy, StageContext};

/// Starts in `execute` and never narrows the tool set. Useful for
/// single-shot tasks where a planning round-trip is pure overhead.
pub struct DirectStrategy;

impl PlanningStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    fn initial_stage(&self) -> PlannerStage {
        PlannerStage::Execute
    }

    fn next_stage(&self, state: &PlannerState) -> PlannerStage {
        state.stage
    }

    fn filter_tools(&self, context: &StageContext<'_>) -> Vec<ToolDefinition> {
        context.tools.to_vec()
    }

    fn system_instruction(&self, _stage: PlannerStage) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_executing_immediately() {
        assert_eq!(DirectStrategy.initial_stage(), PlannerStage::Execute);
    }

    #[test]
    fn never_narrows_the_tool_set() {
        let tools = vec![
            ToolDefinition::new("read_file", "Read a file", serde_json::json!({})),
            ToolDefinition::new("web_search", "Search the web", serde_json::json!({})),
        ];
        let state = PlannerState::new("s1", PlannerStage::Execute);
        let context = StageContext {
            user_request: String::new(),
            tools: &tools,
            state: &state,
        };
        assert_eq!(DirectStrategy.filter_tools(&context).len(), 2);
    }

    #[test]
    fn has_no_stage_instructions() {
        assert!(DirectStrategy
            .system_instruction(PlannerStage::Execute)
            .is_empty());
    }
}
