//! # Agentkeel Core
//!
//! Event log, stream adapter, and boundary types for the Agentkeel agent
//! control plane. This crate owns the one stable contract the rest of the
//! product depends on — the event shape — plus the traits that mark where
//! external collaborators (model provider, tool runner) plug in.
//!
//! ## Design Philosophy
//!
//! All state here is session-scoped: one [`EventLog`] per run, owned by the
//! session that created it, with no process-wide mutable singletons. Every
//! external dependency is a trait so the runtime can be exercised with
//! scripted mocks.

pub mod error;
pub mod event;
pub mod event_log;
pub mod model;
pub mod stream;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ModelError, ToolError};
pub use event::{AgentEvent, EventKind, EventPayload, SystemLevel};
pub use event_log::{EventLog, SubscriptionId};
pub use model::{ModelClient, ModelRequest, ModelResponse, ModelStreamChunk};
pub use stream::{EventStream, EventStreamAdapter};
pub use tool::{ToolCall, ToolDefinition, ToolExecutor, ToolResult};
