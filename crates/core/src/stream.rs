//! Stream adapter — the event log as a cancellable, ordered sequence.
//!
//! One adapter serves one external consumer (typically a network streaming
//! response). Internally it subscribes to every event kind and forwards
//! appended events through an unbounded single-producer/single-consumer
//! queue; the consumer pulls them in append order with [`EventStream::next`].
//! Backpressure is not managed: a session's total event count is bounded by
//! its iteration count, not by external input rate.
//!
//! Cancellation is cooperative and explicit. The token passed to
//! [`EventStreamAdapter::create_stream`] stops future delivery the moment it
//! fires — queued but unread events are never yielded — and does not itself
//! touch the event log. Only [`EventStreamAdapter::abort_stream`] appends,
//! which is how an external cancellation becomes visible to every other
//! subscriber, not just this consumer.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::{AgentEvent, SystemLevel};
use crate::event_log::{EventLog, SubscriptionId};

/// Message carried by the terminal `system` event of aborted runs.
const ABORT_MESSAGE: &str = "Agent run aborted";

/// Bridges one session's [`EventLog`] to pull-based consumers.
pub struct EventStreamAdapter {
    log: Arc<EventLog>,
}

impl EventStreamAdapter {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self { log }
    }

    /// Live stream of every event appended after this call.
    ///
    /// Events are yielded in append order until the log is finalized or
    /// `cancel` fires. Once cancelled, the consumer observes nothing more,
    /// even events that were already queued.
    pub fn create_stream(&self, cancel: CancellationToken) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue_gate = cancel.clone();
        let id = self.log.subscribe_to_types(&[], move |event| {
            if queue_gate.is_cancelled() {
                return Ok(());
            }
            // A closed receiver only means the consumer went away; that is
            // not the log's problem.
            let _ = tx.send(event.clone());
            Ok(())
        });
        EventStream {
            rx,
            cancel,
            subscription: Some((Arc::clone(&self.log), id)),
        }
    }

    /// One-shot stream for runs cancelled before any adapter was attached:
    /// exactly one `system` warning whose message says the run was aborted,
    /// so the consumer still receives a terminal signal.
    pub fn aborted_stream() -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(AgentEvent::system(SystemLevel::Warning, ABORT_MESSAGE));
        EventStream {
            rx,
            cancel: CancellationToken::new(),
            subscription: None,
        }
    }

    /// Hand-off point for the final event of a completed run.
    ///
    /// Appends nothing — the producer already sent the event — and exists so
    /// callers can route the final event into their out-of-band return value
    /// while the adapter records the completion.
    pub fn complete_stream(&self, final_event: AgentEvent) -> AgentEvent {
        debug!(
            session_id = %self.log.session_id(),
            event_id = %final_event.id,
            kind = %final_event.kind(),
            "Event stream complete"
        );
        final_event
    }

    /// Append exactly one `system` warning marking the run as aborted.
    ///
    /// This flows through the log like any other event, so every active
    /// subscription observes the abort, not only the consumer that
    /// requested it.
    pub fn abort_stream(&self) {
        self.log
            .send_event(AgentEvent::system(SystemLevel::Warning, ABORT_MESSAGE));
    }
}

/// Cancellable, ordered sequence of events for a single consumer.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<AgentEvent>,
    cancel: CancellationToken,
    subscription: Option<(Arc<EventLog>, SubscriptionId)>,
}

impl EventStream {
    /// Next event in append order, or `None` once the sequence has ended.
    ///
    /// The sequence ends when the cancellation token fires (immediately,
    /// regardless of queued events) or when the log is finalized and the
    /// queue has drained.
    pub async fn next(&mut self) -> Option<AgentEvent> {
        if self.cancel.is_cancelled() {
            self.teardown();
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.teardown();
                None
            }
            event = self.rx.recv() => {
                if event.is_none() {
                    self.teardown();
                }
                event
            }
        }
    }

    /// True once the consumer-side token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Adapt into a [`futures::Stream`] for transport layers that want one.
    pub fn into_stream(self) -> impl Stream<Item = AgentEvent> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|event| (event, stream))
        })
    }

    fn teardown(&mut self) {
        if let Some((log, id)) = self.subscription.take() {
            log.unsubscribe(id);
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.teardown();
    }
}
