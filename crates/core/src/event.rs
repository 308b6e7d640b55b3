//! Event records — the ground truth of everything that happens in a session.
//!
//! Each step of an agent run (messages, tool calls, tool results, lifecycle
//! markers, system notices) is captured as an immutable [`AgentEvent`].
//! Corrections are expressed as new events; an appended event is never
//! mutated. The serialized shape `{id, timestamp, type, ...}` is the stable
//! contract that persistence, UI, and export layers consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a `system` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemLevel {
    Info,
    Warning,
    Error,
}

/// The closed set of event kinds, used for subscription and query filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UserMessage,
    AssistantMessage,
    AssistantStreamingMessage,
    AssistantThinkingMessage,
    ToolCall,
    ToolResult,
    AgentRunStart,
    AgentRunEnd,
    System,
    EnvironmentInput,
}

impl EventKind {
    /// The wire name of this kind (matches the serialized `type` tag).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserMessage => "user_message",
            Self::AssistantMessage => "assistant_message",
            Self::AssistantStreamingMessage => "assistant_streaming_message",
            Self::AssistantThinkingMessage => "assistant_thinking_message",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::AgentRunStart => "agent_run_start",
            Self::AgentRunEnd => "agent_run_end",
            Self::System => "system",
            Self::EnvironmentInput => "environment_input",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of an event. The serde tag doubles as the `type`
/// field of the serialized event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A request from the user that starts or steers the run.
    UserMessage { content: String },

    /// A complete assistant reply.
    AssistantMessage { content: String },

    /// A partial assistant text delta while streaming.
    AssistantStreamingMessage { delta: String },

    /// Reasoning content the model produced before answering.
    AssistantThinkingMessage { content: String },

    /// The agent is invoking a tool.
    ToolCall {
        call_id: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// A tool finished; correlated to its call by `call_id`.
    ToolResult {
        call_id: String,
        name: String,
        success: bool,
        output: String,
    },

    /// An agent run began.
    AgentRunStart { session_id: String, request: String },

    /// An agent run finished.
    AgentRunEnd { session_id: String, iterations: u32 },

    /// An out-of-band notice from the control plane itself.
    System { level: SystemLevel, message: String },

    /// Input injected by the surrounding environment (not the user).
    EnvironmentInput { source: String, content: String },
}

impl EventPayload {
    /// The kind tag of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserMessage { .. } => EventKind::UserMessage,
            Self::AssistantMessage { .. } => EventKind::AssistantMessage,
            Self::AssistantStreamingMessage { .. } => EventKind::AssistantStreamingMessage,
            Self::AssistantThinkingMessage { .. } => EventKind::AssistantThinkingMessage,
            Self::ToolCall { .. } => EventKind::ToolCall,
            Self::ToolResult { .. } => EventKind::ToolResult,
            Self::AgentRunStart { .. } => EventKind::AgentRunStart,
            Self::AgentRunEnd { .. } => EventKind::AgentRunEnd,
            Self::System { .. } => EventKind::System,
            Self::EnvironmentInput { .. } => EventKind::EnvironmentInput,
        }
    }
}

/// An immutable, timestamped record of one thing that happened during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Unique within a session.
    pub id: String,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// Type tag plus type-specific fields, flattened into the record.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl AgentEvent {
    /// Stamp a fresh id and the current time onto a payload.
    ///
    /// Pure construction — nothing is appended anywhere until the event is
    /// handed to an event log.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The kind tag of this event.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn user_message(content: impl Into<String>) -> Self {
        Self::new(EventPayload::UserMessage {
            content: content.into(),
        })
    }

    pub fn assistant_message(content: impl Into<String>) -> Self {
        Self::new(EventPayload::AssistantMessage {
            content: content.into(),
        })
    }

    pub fn streaming_delta(delta: impl Into<String>) -> Self {
        Self::new(EventPayload::AssistantStreamingMessage {
            delta: delta.into(),
        })
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(EventPayload::AssistantThinkingMessage {
            content: content.into(),
        })
    }

    pub fn tool_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self::new(EventPayload::ToolCall {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        })
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        success: bool,
        output: impl Into<String>,
    ) -> Self {
        Self::new(EventPayload::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            success,
            output: output.into(),
        })
    }

    pub fn run_start(session_id: impl Into<String>, request: impl Into<String>) -> Self {
        Self::new(EventPayload::AgentRunStart {
            session_id: session_id.into(),
            request: request.into(),
        })
    }

    pub fn run_end(session_id: impl Into<String>, iterations: u32) -> Self {
        Self::new(EventPayload::AgentRunEnd {
            session_id: session_id.into(),
            iterations,
        })
    }

    pub fn system(level: SystemLevel, message: impl Into<String>) -> Self {
        Self::new(EventPayload::System {
            level,
            message: message.into(),
        })
    }

    pub fn environment_input(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(EventPayload::EnvironmentInput {
            source: source.into(),
            content: content.into(),
        })
    }
}
