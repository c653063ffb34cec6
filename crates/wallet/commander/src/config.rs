//! Commander configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable prefix (`WALLET_COMMANDER_ENGINE__RESOLVE_ATTEMPTS=5`)
pub const ENV_PREFIX: &str = "WALLET_COMMANDER";

/// Commander configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommanderConfig {
    /// Execution engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Execution engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Children of one parallel group that may run at once
    #[serde(default = "default_max_parallel_branches")]
    pub max_parallel_branches: usize,

    /// Bound on one address resolution attempt
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Bound on one command execution
    #[serde(default = "default_execute_timeout_ms")]
    pub execute_timeout_ms: u64,

    /// Attempts per address; only transient chain failures are retried
    #[serde(default = "default_resolve_attempts")]
    pub resolve_attempts: u32,

    /// Fixed pause between resolution attempts
    #[serde(default = "default_resolve_backoff_ms")]
    pub resolve_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel_branches: default_max_parallel_branches(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            execute_timeout_ms: default_execute_timeout_ms(),
            resolve_attempts: default_resolve_attempts(),
            resolve_backoff_ms: default_resolve_backoff_ms(),
        }
    }
}

impl EngineConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_millis(self.execute_timeout_ms)
    }

    pub fn resolve_backoff(&self) -> Duration {
        Duration::from_millis(self.resolve_backoff_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_max_parallel_branches() -> usize {
    16
}

fn default_resolve_timeout_ms() -> u64 {
    30_000
}

fn default_execute_timeout_ms() -> u64 {
    120_000
}

fn default_resolve_attempts() -> u32 {
    3
}

fn default_resolve_backoff_ms() -> u64 {
    250
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CommanderConfig {
    /// Load configuration: defaults, then the optional file, then the
    /// environment.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&CommanderConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Field names contain underscores, so sections are split on "__"
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
