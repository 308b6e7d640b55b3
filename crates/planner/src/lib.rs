//! Staged planning for Agentkeel — narrows the visible tool set as a
//! multi-step run progresses.
//!
//! Provides:
//! - **Planner**: per-session state machine over `plan` → `execute` →
//!   `completed`, with sticky completion
//! - **Strategies**: pluggable stage policies ([`TwoPhaseStrategy`],
//!   [`DirectStrategy`]) selected by configured name

pub mod direct;
pub mod machine;
pub mod state;
pub mod strategy;
pub mod two_phase;

pub use direct::DirectStrategy;
pub use machine::Planner;
pub use state::{PlannerStage, PlannerState};
pub use strategy::{strategy_by_name, PlanningStrategy, StageContext};
pub use two_phase::TwoPhaseStrategy;
