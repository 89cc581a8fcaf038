//! flowray engine configuration
//!
//! Configuration is a small TOML document; every field is optional.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (FLOWRAY_NUM_WORKERS)
//! 3. Config file (--config flowray.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use flowray::util::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("num_workers = 4").unwrap();
//! assert_eq!(config.num_workers, 4);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::engine::ShutdownMode;
use crate::runtime::scheduler::SchedulerConfig;

/// Environment variable overriding `num_workers`.
pub const NUM_WORKERS_ENV: &str = "FLOWRAY_NUM_WORKERS";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Worker threads executing tasks
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Stack size of worker and actor threads, in bytes
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
    /// Prefix of worker thread names
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
    /// What dropping the last engine handle does
    #[serde(default)]
    pub shutdown_mode: ShutdownMode,
    /// Collect scheduler statistics
    #[serde(default = "default_enable_stats")]
    pub enable_stats: bool,
}

fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_stack_size() -> usize {
    2 * 1024 * 1024
}

fn default_thread_name_prefix() -> String {
    "flowray-worker".to_string()
}

fn default_enable_stats() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            stack_size: default_stack_size(),
            thread_name_prefix: default_thread_name_prefix(),
            shutdown_mode: ShutdownMode::default(),
            enable_stats: default_enable_stats(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with a fixed worker count.
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `FLOWRAY_NUM_WORKERS` if set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        match std::env::var(NUM_WORKERS_ENV) {
            Ok(raw) => self.apply_num_workers_override(&raw),
            Err(_) => Ok(()),
        }
    }

    fn apply_num_workers_override(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.num_workers = raw.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!("{NUM_WORKERS_ENV} must be a positive integer, got `{raw}`"))
        })?;
        self.validate()
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::Invalid("num_workers must be at least 1".to_string()));
        }
        if self.stack_size < 64 * 1024 {
            return Err(ConfigError::Invalid(format!(
                "stack_size must be at least 65536 bytes, got {}",
                self.stack_size
            )));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub(crate) fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            num_workers: self.num_workers,
            stack_size: self.stack_size,
            thread_name_prefix: self.thread_name_prefix.clone(),
            enable_stats: self.enable_stats,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
