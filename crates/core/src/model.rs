//! Model client boundary — the abstraction over the model provider.
//!
//! The control plane never speaks a wire protocol itself. It hands the
//! filtered tool set and the conversation history (an event snapshot) to an
//! opaque [`ModelClient`] and gets back either a complete response or a
//! sequence of streaming chunks. Implementations live outside this
//! workspace; tests use scripted mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::event::AgentEvent;
use crate::tool::{ToolCall, ToolDefinition};

/// One model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Stage-specific guidance prepended to the model's instructions.
    /// Empty when the active planning stage has none.
    #[serde(default)]
    pub system_instruction: String,

    /// Conversation history as an event snapshot, in append order.
    pub history: Vec<AgentEvent>,

    /// Tools the model may call this iteration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A complete (non-streaming) model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The raw text the model produced.
    pub content: String,

    /// Reasoning content, for models that expose it separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Structured tool calls, for models with native tool calling.
    /// Models that embed calls in `content` leave this empty; a tool-call
    /// engine extracts them instead.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Which model actually responded.
    #[serde(default)]
    pub model: String,
}

impl ModelResponse {
    /// A plain text response with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning: None,
            tool_calls: Vec::new(),
            model: String::new(),
        }
    }
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Partial reasoning delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Tool calls surfaced by this chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

/// The model invocation boundary.
///
/// The session loop calls `complete()` or `stream()` without knowing which
/// provider sits behind it.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A human-readable name for this client.
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ModelRequest,
    ) -> std::result::Result<ModelResponse, ModelError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a
    /// single chunk.
    async fn stream(
        &self,
        request: ModelRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ModelStreamChunk, ModelError>>,
        ModelError,
    > {
        let response = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(ModelStreamChunk {
                content: Some(response.content),
                reasoning: response.reasoning,
                tool_calls: response.tool_calls,
                done: true,
            }))
            .await;
        Ok(rx)
    }
}
