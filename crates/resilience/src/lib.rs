//! Resilience primitives for Agentkeel — retry budgets and cooldown gates.
//!
//! Provides:
//! - **Retry budget**: bounded re-execution of fallible async operations,
//!   with pluggable retryability classification and per-retry observation
//! - **Cooldown gate**: time-boxed rejection of calls against a resource
//!   that has asked to be left alone, with lazy expiry

pub mod cooldown;
pub mod retry;

pub use cooldown::{CooldownError, CooldownGate, CooldownSnapshot, COOLDOWN_ERROR_CODE};
pub use retry::{run_with_budget, RetryPolicy};
