//! Error type for a whole agent run.
//!
//! Each boundary keeps its own error enum; this one aggregates them at the
//! session level. Underlying errors are carried as sources, never
//! restated, so whatever the retry budget surfaced reaches the caller
//! intact.

use agentkeel_core::error::ModelError;
use agentkeel_engines::EngineError;
use agentkeel_resilience::CooldownError;
use thiserror::Error;

/// A failure that ended an agent run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The model call failed past the retry budget, or fatally.
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    /// The resolved engine could not make sense of the model output.
    #[error("engine failed to parse model output: {0}")]
    Engine(#[from] EngineError),

    /// A gated resource is still cooling down. Transparent so the fixed
    /// `COOLDOWN_ACTIVE` code stays greppable at the run boundary.
    #[error(transparent)]
    Cooldown(#[from] CooldownError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use agentkeel_resilience::COOLDOWN_ERROR_CODE;

    #[test]
    fn cooldown_code_survives_wrapping() {
        let inner = CooldownError::Active {
            remaining_secs: 3,
            reason: Some("rate limit".into()),
        };
        let err = RuntimeError::from(inner);
        assert!(err.to_string().starts_with(COOLDOWN_ERROR_CODE));
    }

    #[test]
    fn model_error_keeps_its_detail() {
        let err = RuntimeError::from(ModelError::Timeout("60s elapsed".into()));
        assert!(err.to_string().contains("60s elapsed"));
    }
}
