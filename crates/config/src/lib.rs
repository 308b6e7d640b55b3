//! Configuration loading and validation for Agentkeel.
//!
//! Loads configuration from `~/.agentkeel/config.toml` with environment
//! variable overrides. Validates all settings at startup; a missing file
//! means defaults, not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentkeel/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Planner configuration
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Session loop configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Retry budget for transient model failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Cooldown gate for rate-limited resources
    #[serde(default)]
    pub cooldown: CooldownConfig,
}

/// Planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Planning strategy name ("two_phase" or "direct"). Unknown names fall
    /// back to the default strategy at dispatch time with a warning.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Iterations the two-phase strategy may spend planning before
    /// execution is forced.
    #[serde(default = "default_plan_iterations")]
    pub plan_iterations: u32,
}

/// Session loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard cap on agent loop iterations per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

/// Retry budget settings for the model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; `max_retries = 2` means at most
    /// three attempts total.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

/// Cooldown gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Cooldown window used when the rate-limited resource does not say how
    /// long to wait, in milliseconds.
    #[serde(default = "default_cooldown_duration_ms")]
    pub default_duration_ms: u64,
}

fn default_strategy() -> String {
    "two_phase".into()
}
fn default_plan_iterations() -> u32 {
    1
}
fn default_max_iterations() -> u32 {
    10
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_cooldown_duration_ms() -> u64 {
    30_000
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            plan_iterations: default_plan_iterations(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_cooldown_duration_ms(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            session: SessionConfig::default(),
            retry: RetryConfig::default(),
            cooldown: CooldownConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the default location.
    ///
    /// Checks environment variables afterward:
    /// - `AGENTKEEL_STRATEGY` overrides `planner.strategy`
    /// - `AGENTKEEL_MAX_ITERATIONS` overrides `session.max_iterations`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(strategy) = std::env::var("AGENTKEEL_STRATEGY") {
            config.planner.strategy = strategy;
        }

        if let Ok(raw) = std::env::var("AGENTKEEL_MAX_ITERATIONS") {
            match raw.parse() {
                Ok(value) => config.session.max_iterations = value,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "AGENTKEEL_MAX_ITERATIONS is not a number; keeping configured value"
                ),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentkeel")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_iterations must be at least 1".into(),
            ));
        }

        if self.planner.strategy.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "planner.strategy must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for onboarding docs).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.planner.strategy, "two_phase");
        assert_eq!(config.session.max_iterations, 10);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay_ms, 500);
        assert_eq!(config.cooldown.default_duration_ms, 30_000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = RuntimeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: RuntimeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.planner.strategy, config.planner.strategy);
        assert_eq!(parsed.session.max_iterations, config.session.max_iterations);
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = RuntimeConfig {
            session: SessionConfig { max_iterations: 0 },
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_strategy_rejected() {
        let config = RuntimeConfig {
            planner: PlannerConfig {
                strategy: "  ".into(),
                plan_iterations: 1,
            },
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = RuntimeConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().planner.strategy, "two_phase");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let toml_str = r#"
[retry]
max_retries = 5
"#;
        let config: RuntimeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.delay_ms, 500);
        assert_eq!(config.session.max_iterations, 10);
        assert_eq!(config.planner.strategy, "two_phase");
    }

    #[test]
    fn load_from_reads_a_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[planner]
strategy = "direct"

[session]
max_iterations = 3

[cooldown]
default_duration_ms = 1000
"#
        )
        .unwrap();

        let config = RuntimeConfig::load_from(file.path()).unwrap();
        assert_eq!(config.planner.strategy, "direct");
        assert_eq!(config.session.max_iterations, 3);
        assert_eq!(config.cooldown.default_duration_ms, 1000);
        // Untouched sections keep their defaults.
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "session = \"not a table\"").unwrap();

        let err = RuntimeConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = RuntimeConfig::default_toml();
        assert!(toml_str.contains("two_phase"));
        assert!(toml_str.contains("max_iterations"));
    }
}
