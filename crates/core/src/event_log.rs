//! Append-only, subscribable event log — one per agent session.
//!
//! The log is the ordered ground truth of a run. Subscribers register a
//! callback for a set of event kinds and observe matching events in append
//! order, starting with the first event appended after registration. A
//! misbehaving subscriber is isolated: its error is logged and delivery
//! continues to the next subscriber, so a broken consumer can never stall
//! or corrupt agent execution.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::event::{AgentEvent, EventKind};

/// Token handed out by [`EventLog::subscribe_to_types`]; pass it back to
/// [`EventLog::unsubscribe`] to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&AgentEvent) -> anyhow::Result<()> + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    /// Kinds this subscription wants. Empty means every kind.
    kinds: Vec<EventKind>,
    callback: Callback,
}

impl Subscription {
    fn matches(&self, kind: EventKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

#[derive(Default)]
struct LogState {
    events: Vec<AgentEvent>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
    finalized: bool,
}

/// Ordered, append-only sequence of events for one session.
///
/// Appends and reads synchronize on an internal lock, but subscriber
/// callbacks run after the lock is released, so a callback may freely call
/// back into the log (snapshot, subscribe, unsubscribe).
pub struct EventLog {
    session_id: String,
    state: Mutex<LogState>,
}

impl EventLog {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Mutex::new(LogState::default()),
        }
    }

    /// The session this log belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append an event, then notify every matching subscription in
    /// registration order.
    ///
    /// A callback that returns an error is logged and skipped; it never
    /// blocks delivery to later subscribers and never propagates to the
    /// producer. Events are never dropped or reordered on the append path.
    pub fn send_event(&self, event: AgentEvent) {
        let callbacks: Vec<Callback> = {
            let mut state = self.state.lock().unwrap();
            state.events.push(event.clone());
            state
                .subscriptions
                .iter()
                .filter(|s| s.matches(event.kind()))
                .map(|s| Arc::clone(&s.callback))
                .collect()
        };

        for callback in callbacks {
            if let Err(error) = callback(&event) {
                warn!(
                    session_id = %self.session_id,
                    event_id = %event.id,
                    kind = %event.kind(),
                    error = %error,
                    "Event subscriber failed; skipping it"
                );
            }
        }
    }

    /// Snapshot of matching events in append order.
    ///
    /// An empty `kinds` slice matches everything. With `limit`, only the
    /// most recent N matching events are returned (still in append order).
    /// The snapshot is a copy, not a live view.
    pub fn get_events(&self, kinds: &[EventKind], limit: Option<usize>) -> Vec<AgentEvent> {
        let state = self.state.lock().unwrap();
        let matching: Vec<AgentEvent> = state
            .events
            .iter()
            .filter(|e| kinds.is_empty() || kinds.contains(&e.kind()))
            .cloned()
            .collect();
        match limit {
            Some(n) if matching.len() > n => matching[matching.len() - n..].to_vec(),
            _ => matching,
        }
    }

    /// Register a callback invoked once per future event whose kind is in
    /// `kinds` (empty slice: every kind). Events appended before this call
    /// are never delivered to the new subscription.
    ///
    /// On a finalized log the returned token is inert.
    pub fn subscribe_to_types<F>(&self, kinds: &[EventKind], callback: F) -> SubscriptionId
    where
        F: Fn(&AgentEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.state.lock().unwrap();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;

        if state.finalized {
            warn!(
                session_id = %self.session_id,
                "Subscribe on finalized event log; subscription will never fire"
            );
            return id;
        }

        state.subscriptions.push(Subscription {
            id,
            kinds: kinds.to_vec(),
            callback: Arc::new(callback),
        });
        id
    }

    /// Deregister a subscription. Unknown tokens and calls after
    /// [`finalize`](Self::finalize) are no-ops, not errors.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.state.lock().unwrap();
        if state.finalized {
            return;
        }
        state.subscriptions.retain(|s| s.id != id);
    }

    /// Close the log for delivery: all subscriptions are dropped and will
    /// never fire again. Events already appended remain queryable.
    pub fn finalize(&self) {
        let mut state = self.state.lock().unwrap();
        state.finalized = true;
        let dropped = state.subscriptions.len();
        state.subscriptions.clear();
        debug!(
            session_id = %self.session_id,
            subscriptions_dropped = dropped,
            events = state.events.len(),
            "Event log finalized"
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.state.lock().unwrap().finalized
    }

    /// Total number of appended events.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().unwrap().subscriptions.len()
    }

    /// Content of the most recent `user_message` event, if any.
    pub fn last_user_request(&self) -> Option<String> {
        self.get_events(&[EventKind::UserMessage], Some(1))
            .pop()
            .and_then(|event| match event.payload {
                crate::event::EventPayload::UserMessage { content } => Some(content),
                _ => None,
            })
    }
}
