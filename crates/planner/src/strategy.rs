//! The planning strategy seam and name-based dispatch.

use agentkeel_core::tool::ToolDefinition;
use tracing::warn;

use crate::direct::DirectStrategy;
use crate::state::{PlannerStage, PlannerState};
use crate::two_phase::TwoPhaseStrategy;

/// Everything a stage filter may consult.
pub struct StageContext<'a> {
    /// Text of the most recent user request; empty when none exists yet.
    pub user_request: String,

    /// Tools the session could expose this iteration.
    pub tools: &'a [ToolDefinition],

    /// Current planner state.
    pub state: &'a PlannerState,
}

/// A stage-filtering policy for one run.
///
/// Strategies decide the starting stage, when to advance, which tools each
/// stage exposes, and what guidance the model gets. All strategies must
/// eventually let the run reach `completed`; the machine enforces the
/// sticky completion flag itself.
pub trait PlanningStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Stage a fresh session starts in.
    fn initial_stage(&self) -> PlannerStage;

    /// Stage to move to at an iteration boundary. Returning the current
    /// stage means no transition.
    fn next_stage(&self, state: &PlannerState) -> PlannerStage;

    /// Stage-specific tool subset.
    fn filter_tools(&self, context: &StageContext<'_>) -> Vec<ToolDefinition>;

    /// Stage-specific guidance appended to the model instructions.
    /// Empty is valid.
    fn system_instruction(&self, stage: PlannerStage) -> String;
}

/// Closed-set dispatch from a configured strategy name.
///
/// `plan_iterations` applies to strategies with a planning phase; the rest
/// ignore it. Unrecognized names warn and fall back to the default
/// two-phase strategy rather than failing the run.
pub fn strategy_by_name(name: &str, plan_iterations: u32) -> Box<dyn PlanningStrategy> {
    match name {
        "two_phase" => Box::new(TwoPhaseStrategy::new(plan_iterations)),
        "direct" => Box::new(DirectStrategy),
        other => {
            warn!(strategy = other, "Unknown planning strategy; using two_phase");
            Box::new(TwoPhaseStrategy::new(plan_iterations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_dispatch() {
        assert_eq!(strategy_by_name("two_phase", 1).name(), "two_phase");
        assert_eq!(strategy_by_name("direct", 1).name(), "direct");
    }

    #[test]
    fn unknown_name_falls_back_to_default() {
        let strategy = strategy_by_name("quantum_leap", 2);
        assert_eq!(strategy.name(), "two_phase");
        assert_eq!(strategy.initial_stage(), PlannerStage::Plan);
    }
}
