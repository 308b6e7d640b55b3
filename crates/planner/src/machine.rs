//! The per-session planner: stage bookkeeping and tool filtering.

use std::sync::Arc;

use agentkeel_core::event_log::EventLog;
use agentkeel_core::tool::ToolDefinition;
use tracing::{debug, info};

use crate::state::{PlannerStage, PlannerState};
use crate::strategy::{PlanningStrategy, StageContext};

/// Owns the planning state for one session and delegates stage policy to a
/// strategy. Consults the event log for the originating user request when
/// building the per-iteration tool set.
pub struct Planner {
    state: PlannerState,
    strategy: Box<dyn PlanningStrategy>,
    log: Arc<EventLog>,
}

impl Planner {
    pub fn new(strategy: Box<dyn PlanningStrategy>, log: Arc<EventLog>) -> Self {
        let state = PlannerState::new(log.session_id(), strategy.initial_stage());
        Self {
            state,
            strategy,
            log,
        }
    }

    /// Record the iteration and let the strategy advance the stage. Stage
    /// changes happen only here, at the iteration boundary.
    pub fn on_loop_start(&mut self, iteration: u32) {
        self.state.iteration = iteration;
        if !self.state.completed {
            let next = self.strategy.next_stage(&self.state);
            if next != self.state.stage {
                info!(
                    session_id = %self.state.session_id,
                    from = %self.state.stage,
                    to = %next,
                    "Planner stage transition"
                );
                self.state.stage = next;
            }
        }
        debug!(
            session_id = %self.state.session_id,
            iteration,
            stage = %self.state.stage,
            steps = self.state.steps.len(),
            completed = self.state.completed,
            "Planner loop start"
        );
    }

    /// The tool set the model sees this iteration.
    ///
    /// Once the run is completed, planning no longer constrains execution:
    /// every available tool passes through unfiltered regardless of what the
    /// strategy's filter would do.
    pub fn build_tools(&self, available: &[ToolDefinition]) -> Vec<ToolDefinition> {
        if self.state.completed {
            return available.to_vec();
        }
        let context = StageContext {
            user_request: self.log.last_user_request().unwrap_or_default(),
            tools: available,
            state: &self.state,
        };
        self.strategy.filter_tools(&context)
    }

    /// Stage-specific guidance for the model; may be empty.
    pub fn system_instruction(&self) -> String {
        self.strategy.system_instruction(self.state.stage)
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    /// Mark the run completed. Sticky: nothing unsets it within a run.
    pub fn mark_completed(&mut self) {
        if self.state.completed {
            return;
        }
        self.state.completed = true;
        self.state.stage = PlannerStage::Completed;
        info!(
            session_id = %self.state.session_id,
            iteration = self.state.iteration,
            "Planner marked run completed"
        );
    }

    /// Extract planned sub-tasks from a plan-stage response: bulleted and
    /// numbered lines become steps. Returns how many steps were added.
    pub fn record_plan(&mut self, content: &str) -> usize {
        let before = self.state.steps.len();
        for line in content.lines() {
            if let Some(step) = plan_step(line) {
                self.state.steps.push(step.to_string());
            }
        }
        let added = self.state.steps.len() - before;
        if added > 0 {
            debug!(
                session_id = %self.state.session_id,
                added,
                total = self.state.steps.len(),
                "Recorded plan steps"
            );
        }
        added
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }
}

/// A line is a step when it is bulleted (`- `, `* `) or numbered (`1.`, `2)`).
fn plan_step(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        let rest = rest.trim();
        return (!rest.is_empty()).then_some(rest);
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..]
            .strip_prefix('.')
            .or_else(|| trimmed[digits..].strip_prefix(')'))
        {
            let rest = rest.trim();
            return (!rest.is_empty()).then_some(rest);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::two_phase::TwoPhaseStrategy;
    use agentkeel_core::event::AgentEvent;

    /// A filter that hides everything, to prove completion overrides it.
    struct NarrowingStrategy;

    impl PlanningStrategy for NarrowingStrategy {
        fn name(&self) -> &str {
            "narrowing"
        }
        fn initial_stage(&self) -> PlannerStage {
            PlannerStage::Execute
        }
        fn next_stage(&self, state: &PlannerState) -> PlannerStage {
            state.stage
        }
        fn filter_tools(&self, _context: &StageContext<'_>) -> Vec<ToolDefinition> {
            Vec::new()
        }
        fn system_instruction(&self, _stage: PlannerStage) -> String {
            String::new()
        }
    }

    fn tools() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("create_plan", "Write down the plan", serde_json::json!({})),
            ToolDefinition::new(
                "read_file",
                "Read a file from the workspace",
                serde_json::json!({}),
            ),
        ]
    }

    fn two_phase_planner() -> Planner {
        Planner::new(
            Box::new(TwoPhaseStrategy::default()),
            Arc::new(EventLog::new("s1")),
        )
    }

    #[test]
    fn first_iteration_stays_in_plan_and_narrows() {
        let mut planner = two_phase_planner();
        planner.on_loop_start(1);

        assert_eq!(planner.state().stage, PlannerStage::Plan);
        let visible = planner.build_tools(&tools());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "create_plan");
    }

    #[test]
    fn second_iteration_moves_to_execute() {
        let mut planner = two_phase_planner();
        planner.on_loop_start(1);
        planner.on_loop_start(2);

        assert_eq!(planner.state().stage, PlannerStage::Execute);
        assert_eq!(planner.build_tools(&tools()).len(), 2);
    }

    #[test]
    fn recorded_steps_force_the_transition() {
        let mut planner = Planner::new(
            Box::new(TwoPhaseStrategy::new(10)),
            Arc::new(EventLog::new("s1")),
        );
        planner.on_loop_start(1);
        let added = planner.record_plan("1. capture the page\n2. check the banner");
        assert_eq!(added, 2);

        planner.on_loop_start(2);
        assert_eq!(planner.state().stage, PlannerStage::Execute);
        assert_eq!(planner.state().steps.len(), 2);
    }

    #[test]
    fn plan_filter_reads_the_latest_user_request() {
        let log = Arc::new(EventLog::new("s1"));
        log.send_event(AgentEvent::user_message(
            "Use read_file on Cargo.toml and summarize it",
        ));
        let mut planner = Planner::new(Box::new(TwoPhaseStrategy::default()), Arc::clone(&log));
        planner.on_loop_start(1);

        let names: Vec<String> = planner
            .build_tools(&tools())
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["create_plan", "read_file"]);
    }

    #[test]
    fn completion_is_sticky_and_unfilters() {
        let mut planner = Planner::new(
            Box::new(NarrowingStrategy),
            Arc::new(EventLog::new("s1")),
        );
        planner.on_loop_start(1);
        assert!(planner.build_tools(&tools()).is_empty());

        planner.mark_completed();
        assert!(planner.is_completed());
        assert_eq!(planner.state().stage, PlannerStage::Completed);

        // Completed overrides the strategy filter entirely.
        assert_eq!(planner.build_tools(&tools()).len(), 2);

        // And stays that way through later iterations.
        planner.on_loop_start(7);
        assert!(planner.is_completed());
        assert_eq!(planner.state().stage, PlannerStage::Completed);
        assert_eq!(planner.build_tools(&tools()).len(), 2);
    }

    #[test]
    fn mark_completed_twice_is_harmless() {
        let mut planner = two_phase_planner();
        planner.mark_completed();
        planner.mark_completed();
        assert!(planner.is_completed());
    }

    #[test]
    fn record_plan_ignores_prose() {
        let mut planner = two_phase_planner();
        let added = planner.record_plan(
            "Here is my plan:\n- capture the page\nsome commentary\n2) check the banner\n-\n",
        );
        assert_eq!(added, 2);
        assert_eq!(
            planner.state().steps,
            vec!["capture the page", "check the banner"]
        );
    }

    #[test]
    fn instruction_follows_the_stage() {
        let mut planner = two_phase_planner();
        planner.on_loop_start(1);
        assert!(!planner.system_instruction().is_empty());

        planner.mark_completed();
        assert!(planner.system_instruction().is_empty());
    }

    #[test]
    fn iteration_counter_tracks_loop_starts() {
        let mut planner = two_phase_planner();
        planner.on_loop_start(1);
        assert_eq!(planner.state().iteration, 1);
        planner.on_loop_start(2);
        assert_eq!(planner.state().iteration, 2);
        assert_eq!(planner.strategy_name(), "two_phase");
    }
}
