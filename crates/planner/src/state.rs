//! Per-session planning state.

use serde::{Deserialize, Serialize};

/// The stage an agent run is in.
///
/// Runs move forward only: `plan` → `execute` → `completed`. Strategies
/// decide when the first transition happens; [`completed`] is terminal.
///
/// [`completed`]: PlannerStage::Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerStage {
    Plan,
    Execute,
    Completed,
}

impl PlannerStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlannerStage::Plan => "plan",
            PlannerStage::Execute => "execute",
            PlannerStage::Completed => "completed",
        }
    }
}

impl std::fmt::Display for PlannerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The one mutable planning record per session.
///
/// Mutated only by [`crate::machine::Planner`], once per iteration
/// boundary. `completed` is sticky: once true it never reverts within the
/// same run.
#[derive(Debug, Clone, Serialize)]
pub struct PlannerState {
    pub session_id: String,
    pub stage: PlannerStage,
    /// Planned sub-tasks, in plan order. May stay empty.
    pub steps: Vec<String>,
    pub completed: bool,
    /// Monotonic loop counter, 1-indexed; 0 before the first iteration.
    pub iteration: u32,
}

impl PlannerState {
    pub fn new(session_id: impl Into<String>, stage: PlannerStage) -> Self {
        Self {
            session_id: session_id.into(),
            stage,
            steps: Vec::new(),
            completed: false,
            iteration: 0,
        }
    }
}
