//! Cooldown gate — time-boxed rejection of over-eager attempts.
//!
//! Once activated with a reason and duration, the gate rejects further
//! attempts until the deadline passes, and reports the remaining time.
//! Expiry is lazy: reads reconcile an already-passed deadline before
//! reporting, so no timer tasks are involved and redundant reconciliation
//! from multiple call sites is safe. One instance guards one resource.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Greppable code prefix carried by every cooldown rejection, so calling
/// layers can tell "temporarily blocked" from other failures without
/// matching on the human-readable reason.
pub const COOLDOWN_ERROR_CODE: &str = "COOLDOWN_ACTIVE";

/// Rejection raised by [`CooldownGate::assert_ready`] while the gate holds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CooldownError {
    #[error("COOLDOWN_ACTIVE: blocked for {remaining_secs}s more ({})", .reason.as_deref().unwrap_or("no reason recorded"))]
    Active {
        /// Remaining time in whole seconds, rounded up, at least 1.
        remaining_secs: i64,
        reason: Option<String>,
    },
}

/// Point-in-time view of the gate, reconciled against the query time.
#[derive(Debug, Clone, Serialize)]
pub struct CooldownSnapshot {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CooldownSnapshot {
    fn inactive() -> Self {
        Self {
            active: false,
            until: None,
            remaining_ms: None,
            reason: None,
        }
    }
}

/// Session-scoped gate over one rate-limited resource.
///
/// Owned and mutated by a single component; reads take `&mut self` because
/// lazy expiry clears stored state in place.
pub struct CooldownGate {
    default_duration: Duration,
    until: Option<DateTime<Utc>>,
    reason: Option<String>,
}

impl CooldownGate {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            default_duration,
            until: None,
            reason: None,
        }
    }

    /// Activate with the default duration, unconditionally overwriting any
    /// prior activation.
    pub fn activate(&mut self, reason: impl Into<String>) {
        self.activate_for(reason, self.default_duration);
    }

    /// Activate until now + `duration` (floored at zero), unconditionally
    /// overwriting any prior activation.
    pub fn activate_for(&mut self, reason: impl Into<String>, duration: Duration) {
        let duration = duration.max(Duration::zero());
        let reason = reason.into();
        let until = Utc::now() + duration;
        debug!(
            until = %until,
            duration_ms = duration.num_milliseconds(),
            reason = %reason,
            "Cooldown activated"
        );
        self.until = Some(until);
        self.reason = Some(reason);
    }

    /// Reset to inactive.
    pub fn clear(&mut self) {
        self.until = None;
        self.reason = None;
    }

    /// Report status as of `now`, lazily clearing an expired deadline.
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> CooldownSnapshot {
        match self.until {
            Some(until) if until > now => CooldownSnapshot {
                active: true,
                until: Some(until),
                remaining_ms: Some((until - now).num_milliseconds()),
                reason: self.reason.clone(),
            },
            Some(until) => {
                debug!(until = %until, "Cooldown expired; clearing");
                self.clear();
                CooldownSnapshot::inactive()
            }
            None => CooldownSnapshot::inactive(),
        }
    }

    /// Return normally if the gate is inactive as of `now`; otherwise raise
    /// a [`CooldownError`] embedding [`COOLDOWN_ERROR_CODE`], the remaining
    /// whole seconds (rounded up, minimum 1), and the stored reason.
    pub fn assert_ready(&mut self, now: DateTime<Utc>) -> Result<(), CooldownError> {
        let snapshot = self.snapshot(now);
        if !snapshot.active {
            return Ok(());
        }
        let remaining_ms = snapshot.remaining_ms.unwrap_or(0);
        let remaining_secs = (remaining_ms / 1000 + (remaining_ms % 1000 > 0) as i64).max(1);
        Err(CooldownError::Active {
            remaining_secs,
            reason: snapshot.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CooldownGate {
        CooldownGate::new(Duration::seconds(30))
    }

    #[test]
    fn activation_reports_active_with_reason() {
        let mut gate = gate();
        gate.activate_for("auth refresh failed", Duration::seconds(5));

        let snap = gate.snapshot(Utc::now());
        assert!(snap.active);
        assert_eq!(snap.reason.as_deref(), Some("auth refresh failed"));
        assert!(snap.until.is_some());
        let remaining = snap.remaining_ms.unwrap();
        assert!(remaining > 4_000 && remaining <= 5_000);
    }

    #[test]
    fn remaining_is_deadline_minus_query_time() {
        let mut gate = gate();
        gate.activate_for("throttled", Duration::seconds(5));
        let until = gate.snapshot(Utc::now()).until.unwrap();

        let snap = gate.snapshot(until - Duration::seconds(2));
        assert!(snap.active);
        assert_eq!(snap.remaining_ms, Some(2_000));
    }

    #[test]
    fn lazy_expiry_clears_state() {
        let mut gate = gate();
        gate.activate_for("throttled", Duration::seconds(5));
        let until = gate.snapshot(Utc::now()).until.unwrap();

        let snap = gate.snapshot(until + Duration::seconds(1));
        assert!(!snap.active);
        assert!(snap.reason.is_none());

        // Cleared for good, not just reported inactive once.
        let again = gate.snapshot(Utc::now());
        assert!(!again.active);
    }

    #[test]
    fn deadline_exactly_now_counts_as_expired() {
        let mut gate = gate();
        gate.activate_for("throttled", Duration::seconds(5));
        let until = gate.snapshot(Utc::now()).until.unwrap();
        assert!(!gate.snapshot(until).active);
    }

    #[test]
    fn reactivation_overwrites_unconditionally() {
        let mut gate = gate();
        gate.activate_for("first", Duration::seconds(5));
        let first_until = gate.snapshot(Utc::now()).until.unwrap();

        gate.activate_for("second", Duration::seconds(60));
        let snap = gate.snapshot(Utc::now());
        assert_eq!(snap.reason.as_deref(), Some("second"));
        assert!(snap.until.unwrap() > first_until);
    }

    #[test]
    fn clear_resets_to_inactive() {
        let mut gate = gate();
        gate.activate("stop");
        gate.clear();
        assert!(!gate.snapshot(Utc::now()).active);
        assert!(gate.assert_ready(Utc::now()).is_ok());
    }

    #[test]
    fn activate_uses_default_duration() {
        let mut gate = CooldownGate::new(Duration::seconds(30));
        gate.activate("default window");
        let remaining = gate.snapshot(Utc::now()).remaining_ms.unwrap();
        assert!(remaining > 29_000 && remaining <= 30_000);
    }

    #[test]
    fn zero_duration_is_immediately_inactive() {
        let mut gate = gate();
        gate.activate_for("blip", Duration::zero());
        assert!(!gate.snapshot(Utc::now()).active);
    }

    #[test]
    fn negative_duration_is_floored_to_zero() {
        let mut gate = gate();
        gate.activate_for("clock skew", Duration::seconds(-10));
        assert!(!gate.snapshot(Utc::now()).active);
        assert!(gate.assert_ready(Utc::now()).is_ok());
    }

    #[test]
    fn assert_ready_embeds_code_seconds_and_reason() {
        let mut gate = gate();
        gate.activate_for("auth refresh failed", Duration::seconds(5));
        let until = gate.snapshot(Utc::now()).until.unwrap();

        let err = gate
            .assert_ready(until - Duration::milliseconds(1_500))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains(COOLDOWN_ERROR_CODE));
        assert!(message.contains("auth refresh failed"));
        // 1500ms rounds up to 2 whole seconds.
        assert!(message.contains("2s"));
        match err {
            CooldownError::Active { remaining_secs, .. } => assert_eq!(remaining_secs, 2),
        }
    }

    #[test]
    fn assert_ready_reports_at_least_one_second() {
        let mut gate = gate();
        gate.activate_for("nearly done", Duration::seconds(5));
        let until = gate.snapshot(Utc::now()).until.unwrap();

        let err = gate
            .assert_ready(until - Duration::milliseconds(200))
            .unwrap_err();
        match err {
            CooldownError::Active { remaining_secs, .. } => assert_eq!(remaining_secs, 1),
        }
    }

    #[test]
    fn assert_ready_without_reason_still_carries_code() {
        let mut gate = gate();
        gate.activate_for("", Duration::seconds(5));
        let until = gate.snapshot(Utc::now()).until.unwrap();
        let message = gate
            .assert_ready(until - Duration::seconds(3))
            .unwrap_err()
            .to_string();
        assert!(message.contains(COOLDOWN_ERROR_CODE));
    }

    #[test]
    fn snapshot_serializes_compactly_when_inactive() {
        let mut gate = gate();
        let json = serde_json::to_string(&gate.snapshot(Utc::now())).unwrap();
        assert_eq!(json, r#"{"active":false}"#);
    }
}
