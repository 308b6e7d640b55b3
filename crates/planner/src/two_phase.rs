//! Default strategy: plan first, then execute.
//!
//! The plan stage exposes only planning and reasoning tools so the model
//! writes a plan before touching anything, with one escape hatch: a tool
//! the user named in their request stays visible. Execution starts once
//! steps exist or the plan-iteration allowance is spent.

use agentkeel_core::tool::ToolDefinition;

use crate::state::{PlannerStage, PlannerState};
use crate::strategy::{PlanningStrategy, StageContext};

const PLANNING_VOCABULARY: &[&str] = &["plan", "think", "reason", "note"];

pub struct TwoPhaseStrategy {
    /// Iterations allowed in the plan stage before execution is forced even
    /// without recorded steps.
    plan_iterations: u32,
}

impl TwoPhaseStrategy {
    pub fn new(plan_iterations: u32) -> Self {
        Self { plan_iterations }
    }
}

impl Default for TwoPhaseStrategy {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PlanningStrategy for TwoPhaseStrategy {
    fn name(&self) -> &str {
        "two_phase"
    }

    fn initial_stage(&self) -> PlannerStage {
        PlannerStage::Plan
    }

    fn next_stage(&self, state: &PlannerState) -> PlannerStage {
        match state.stage {
            PlannerStage::Plan
                if !state.steps.is_empty() || state.iteration > self.plan_iterations =>
            {
                PlannerStage::Execute
            }
            stage => stage,
        }
    }

    fn filter_tools(&self, context: &StageContext<'_>) -> Vec<ToolDefinition> {
        match context.state.stage {
            PlannerStage::Plan => {
                let request = context.user_request.to_lowercase();
                context
                    .tools
                    .iter()
                    .filter(|tool| {
                        is_planning_tool(tool) || request.contains(&tool.name.to_lowercase())
                    })
                    .cloned()
                    .collect()
            }
            PlannerStage::Execute | PlannerStage::Completed => context.tools.to_vec(),
        }
    }

    fn system_instruction(&self, stage: PlannerStage) -> String {
        match stage {
            PlannerStage::Plan => {
                "Break the request into a short numbered list of steps before taking any \
                 action. Do not execute anything yet."
                    .to_string()
            }
            PlannerStage::Execute => {
                "Work through the plan one step at a time, calling tools as needed.".to_string()
            }
            PlannerStage::Completed => String::new(),
        }
    }
}

fn is_planning_tool(tool: &ToolDefinition) -> bool {
    let name = tool.name.to_lowercase();
    let description = tool.description.to_lowercase();
    PLANNING_VOCABULARY
        .iter()
        .any(|word| name.contains(word) || description.contains(word))
}
