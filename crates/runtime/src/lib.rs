//! The session runtime — the loop that drives an Agentkeel run.
//!
//! A run follows a **plan → act → observe** cycle:
//!
//! 1. **Advance** the planner and narrow the visible tool set
//! 2. **Resolve** the tool-call engine for that tool set
//! 3. **Call the model** under the retry budget, behind the cooldown gate
//! 4. **Parse** the response through the resolved engine
//! 5. **If tool calls**: execute them, append correlated results, loop
//! 6. **If text only**: the run is complete
//!
//! Every step is appended to the session's event log as it happens, so
//! persistence, UI, and streaming consumers all watch the same record. The
//! loop ends when the model stops requesting tools, the iteration cap is
//! reached, or the cancellation token fires.

pub mod error;
pub mod session;

pub use error::{Result, RuntimeError};
pub use session::{RunOutcome, Session};
