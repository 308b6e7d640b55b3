//! The session loop — one agent run from user request to final answer.
//!
//! Provides:
//! - **Session**: owns the event log, planner, engine registry, cooldown
//!   gate, and the model/tool boundaries for a single run
//! - **run**: the iterate-until-done loop (plan, call, parse, execute)
//! - **run_streaming**: the same loop with a live event stream attached
//!
//! The loop appends every step to the event log as it happens; observers
//! follow a run through the log, not through return values. Model calls go
//! through the retry budget, and a rate limit arms the cooldown gate so the
//! next call fails fast with a readable wait instead of hammering the
//! provider.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agentkeel_config::RuntimeConfig;
use agentkeel_core::error::ModelError;
use agentkeel_core::event::{AgentEvent, EventKind, SystemLevel};
use agentkeel_core::event_log::EventLog;
use agentkeel_core::model::{ModelClient, ModelRequest, ModelResponse};
use agentkeel_core::stream::{EventStream, EventStreamAdapter};
use agentkeel_core::tool::{ToolCall, ToolDefinition, ToolExecutor};
use agentkeel_engines::{default_registry, EngineRegistry, ParsedOutput};
use agentkeel_planner::{strategy_by_name, Planner, PlannerStage, PlanningStrategy};
use agentkeel_resilience::{run_with_budget, CooldownGate, CooldownSnapshot, RetryPolicy};

use crate::error::{Result, RuntimeError};

/// Event kinds replayed to the model as conversation history.
const HISTORY_KINDS: &[EventKind] = &[
    EventKind::UserMessage,
    EventKind::AssistantMessage,
    EventKind::ToolCall,
    EventKind::ToolResult,
];

/// Summary a finished run hands back out-of-band. The full record of what
/// happened lives in the event log.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub session_id: String,

    /// Final assistant text; empty when the run never produced one.
    pub response: String,

    /// Loop iterations completed.
    pub iterations: u32,

    /// True when the run ended through cancellation.
    pub aborted: bool,

    /// Terminal event of a normally completed run.
    pub final_event: Option<AgentEvent>,
}

/// One agent run: carries a user request through planning, model calls,
/// engine parsing, and tool execution until the model stops asking for
/// tools.
pub struct Session {
    log: Arc<EventLog>,
    planner: Planner,
    registry: EngineRegistry,
    cooldown: CooldownGate,
    retry: RetryPolicy<ModelError>,
    model: Arc<dyn ModelClient>,
    executor: Arc<dyn ToolExecutor>,
    max_iterations: u32,
    cancel: CancellationToken,
}

impl Session {
    /// A session with the default configuration.
    pub fn new(model: Arc<dyn ModelClient>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self::with_config(model, executor, &RuntimeConfig::default())
    }

    /// A session wired from a loaded configuration.
    pub fn with_config(
        model: Arc<dyn ModelClient>,
        executor: Arc<dyn ToolExecutor>,
        config: &RuntimeConfig,
    ) -> Self {
        let log = Arc::new(EventLog::new(Uuid::new_v4().to_string()));
        let strategy = strategy_by_name(&config.planner.strategy, config.planner.plan_iterations);
        let planner = Planner::new(strategy, Arc::clone(&log));
        let retry = RetryPolicy::new(
            config.retry.max_retries,
            Duration::from_millis(config.retry.delay_ms),
        )
        .with_retryable(transient_model_error);
        let cooldown = CooldownGate::new(ChronoDuration::milliseconds(
            config.cooldown.default_duration_ms as i64,
        ));

        Self {
            log,
            planner,
            registry: default_registry(),
            cooldown,
            retry,
            model,
            executor,
            max_iterations: config.session.max_iterations,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the default engine registry.
    pub fn with_registry(mut self, registry: EngineRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the planning strategy chosen by configuration.
    pub fn with_strategy(mut self, strategy: Box<dyn PlanningStrategy>) -> Self {
        self.planner = Planner::new(strategy, Arc::clone(&self.log));
        self
    }

    /// Override the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Drive the run from an external cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Override the retry policy for model calls.
    pub fn with_retry_policy(mut self, retry: RetryPolicy<ModelError>) -> Self {
        self.retry = retry;
        self
    }

    pub fn session_id(&self) -> &str {
        self.log.session_id()
    }

    /// The session's event log, for attaching subscribers before a run.
    pub fn log(&self) -> Arc<EventLog> {
        Arc::clone(&self.log)
    }

    /// Token that aborts this session's run when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Where the cooldown gate stands right now.
    pub fn cooldown_snapshot(&mut self) -> CooldownSnapshot {
        self.cooldown.snapshot(Utc::now())
    }

    /// Drive the loop until the model answers without requesting tools, the
    /// iteration cap is hit, or the run is cancelled.
    ///
    /// Every step lands in the event log; the returned outcome is a
    /// convenience summary. A fatal error appends a terminal `system` event
    /// and finalizes the log before propagating unchanged.
    pub async fn run(&mut self, user_request: impl Into<String>) -> Result<RunOutcome> {
        let request = user_request.into();
        info!(
            session_id = %self.log.session_id(),
            strategy = self.planner.strategy_name(),
            "Starting agent run"
        );
        self.log
            .send_event(AgentEvent::run_start(self.log.session_id(), &request));
        self.log.send_event(AgentEvent::user_message(&request));

        let available = self.executor.definitions();
        let mut iteration: u32 = 0;
        let mut response_text = String::new();
        let mut aborted = false;

        loop {
            if self.cancel.is_cancelled() {
                aborted = true;
                break;
            }
            iteration += 1;
            if iteration > self.max_iterations {
                warn!(
                    session_id = %self.log.session_id(),
                    max_iterations = self.max_iterations,
                    "Iteration cap reached; ending run"
                );
                self.log.send_event(AgentEvent::system(
                    SystemLevel::Warning,
                    format!("Reached the maximum of {} iterations", self.max_iterations),
                ));
                break;
            }

            self.planner.on_loop_start(iteration);
            let tools = self.planner.build_tools(&available);
            let engine = self.registry.resolve(&tools);
            debug!(
                session_id = %self.log.session_id(),
                iteration,
                stage = %self.planner.state().stage,
                engine = engine.name(),
                tools = tools.len(),
                "Loop iteration"
            );

            let response = match self.call_model(&tools).await {
                Ok(response) => response,
                Err(error) => return Err(self.fail(error)),
            };
            let parsed = match engine.parse(&response) {
                Ok(parsed) => parsed,
                Err(error) => return Err(self.fail(error.into())),
            };

            self.record_output(&parsed);
            if !parsed.text.is_empty() {
                response_text = parsed.text.clone();
            }

            if self.planner.state().stage == PlannerStage::Plan {
                // A planning answer is an intermediate step even without
                // tool calls; the next iteration decides the transition.
                self.planner.record_plan(&parsed.text);
            } else if parsed.tool_calls.is_empty() {
                break;
            }

            for call in &parsed.tool_calls {
                if self.cancel.is_cancelled() {
                    aborted = true;
                    break;
                }
                self.dispatch_tool(call).await;
            }
            if aborted {
                break;
            }
        }

        let iterations = iteration.min(self.max_iterations);
        let adapter = EventStreamAdapter::new(Arc::clone(&self.log));
        let final_event = if aborted {
            adapter.abort_stream();
            None
        } else {
            let run_end = AgentEvent::run_end(self.log.session_id(), iterations);
            self.log.send_event(run_end.clone());
            Some(adapter.complete_stream(run_end))
        };
        self.planner.mark_completed();
        self.log.finalize();
        info!(
            session_id = %self.log.session_id(),
            iterations,
            aborted,
            "Agent run finished"
        );

        Ok(RunOutcome {
            session_id: self.log.session_id().to_string(),
            response: response_text,
            iterations,
            aborted,
            final_event,
        })
    }

    /// Run with a live event stream attached.
    ///
    /// The stream yields every event the run appends, in order, and ends
    /// once the log is finalized or the cancellation token fires. A session
    /// cancelled before this call gets a one-shot abort stream, and the
    /// spawned run reports an aborted outcome without doing any work.
    pub fn run_streaming(
        mut self,
        user_request: impl Into<String>,
    ) -> (EventStream, JoinHandle<Result<RunOutcome>>) {
        let request = user_request.into();
        if self.cancel.is_cancelled() {
            let stream = EventStreamAdapter::aborted_stream();
            let handle = tokio::spawn(async move {
                self.log.finalize();
                Ok(RunOutcome {
                    session_id: self.log.session_id().to_string(),
                    response: String::new(),
                    iterations: 0,
                    aborted: true,
                    final_event: None,
                })
            });
            return (stream, handle);
        }

        let adapter = EventStreamAdapter::new(Arc::clone(&self.log));
        let stream = adapter.create_stream(self.cancel.clone());
        let handle = tokio::spawn(async move { self.run(request).await });
        (stream, handle)
    }

    /// One model invocation under the retry budget, gated by the cooldown.
    ///
    /// A rate limit arms the cooldown gate and surfaces immediately; the
    /// retry budget only covers transient transport failures.
    async fn call_model(&mut self, tools: &[ToolDefinition]) -> Result<ModelResponse> {
        self.cooldown.assert_ready(Utc::now())?;

        let request = ModelRequest {
            system_instruction: self.planner.system_instruction(),
            history: self.log.get_events(HISTORY_KINDS, None),
            tools: tools.to_vec(),
        };
        let model = Arc::clone(&self.model);
        let result = run_with_budget(&self.retry, || {
            let request = request.clone();
            let model = Arc::clone(&model);
            async move { model.complete(request).await }
        })
        .await;

        match result {
            Ok(response) => Ok(response),
            Err(ModelError::RateLimited { retry_after_secs }) => {
                if retry_after_secs > 0 {
                    self.cooldown.activate_for(
                        "model provider rate limit",
                        ChronoDuration::seconds(retry_after_secs as i64),
                    );
                } else {
                    self.cooldown.activate("model provider rate limit");
                }
                Err(RuntimeError::Model(ModelError::RateLimited {
                    retry_after_secs,
                }))
            }
            Err(error) => Err(RuntimeError::Model(error)),
        }
    }

    /// Append what the model said this iteration.
    fn record_output(&self, parsed: &ParsedOutput) {
        if let Some(reasoning) = parsed.reasoning.as_deref().filter(|r| !r.is_empty()) {
            self.log.send_event(AgentEvent::thinking(reasoning));
        }
        if !parsed.text.is_empty() {
            self.log
                .send_event(AgentEvent::assistant_message(parsed.text.clone()));
        }
    }

    /// Execute one tool call and append the correlated result.
    ///
    /// Executor failures become failed `tool_result` events rather than
    /// ending the run; the model sees the error text and can adjust.
    async fn dispatch_tool(&self, call: &ToolCall) {
        self.log.send_event(AgentEvent::tool_call(
            &call.id,
            &call.name,
            call.arguments.clone(),
        ));
        match self.executor.execute(call).await {
            Ok(result) => {
                self.log.send_event(AgentEvent::tool_result(
                    &call.id,
                    &call.name,
                    result.success,
                    result.output,
                ));
            }
            Err(error) => {
                warn!(
                    session_id = %self.log.session_id(),
                    tool = %call.name,
                    error = %error,
                    "Tool execution failed"
                );
                self.log.send_event(AgentEvent::tool_result(
                    &call.id,
                    &call.name,
                    false,
                    format!("Error: {error}"),
                ));
            }
        }
    }

    /// Terminal bookkeeping for a fatal error: record it, close the log,
    /// hand the error back unchanged.
    fn fail(&mut self, error: RuntimeError) -> RuntimeError {
        warn!(
            session_id = %self.log.session_id(),
            error = %error,
            "Agent run failed"
        );
        self.log.send_event(AgentEvent::system(
            SystemLevel::Error,
            format!("Run failed: {error}"),
        ));
        self.planner.mark_completed();
        self.log.finalize();
        error
    }
}

/// Errors worth another attempt: transport hiccups and provider-side
/// breakage, not provider verdicts about this request.
fn transient_model_error(error: &ModelError) -> bool {
    match error {
        ModelError::Network(_) | ModelError::Timeout(_) | ModelError::StreamInterrupted(_) => true,
        ModelError::Api { status_code, .. } => *status_code >= 500,
        _ => false,
    }
}
