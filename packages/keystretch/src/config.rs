//! Service configuration
//!
//! Defaults, then an optional JSON file, then environment overrides.

use crate::error::ConfigError;
use keystretch_async_task::ExecutorConfig;
use keystretch_key::{PBKDF2_ITER_DEFAULT, PBKDF2_ITER_MAX};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`ServiceConfig::workers`]
pub const ENV_WORKERS: &str = "KEYSTRETCH_WORKERS";
/// Environment variable overriding [`ServiceConfig::queue_capacity`]
pub const ENV_QUEUE_CAPACITY: &str = "KEYSTRETCH_QUEUE_CAPACITY";
/// Environment variable overriding [`ServiceConfig::max_iterations`]
pub const ENV_MAX_ITERATIONS: &str = "KEYSTRETCH_MAX_ITERATIONS";

const MAX_DEFAULT_WORKERS: usize = 8;

/// Derivation service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Worker threads running derivations
    pub workers: usize,
    /// Requests that may wait for a worker before callers block
    pub queue_capacity: usize,
    /// Largest accepted iteration count
    pub max_iterations: u32,
    /// Iteration count used when a caller does not pick one
    pub default_iterations: u32,
    /// Worker thread name prefix
    pub thread_name: String,
    /// Track pool counters
    pub enable_metrics: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS),
            queue_capacity: 64,
            max_iterations: PBKDF2_ITER_MAX,
            default_iterations: PBKDF2_ITER_DEFAULT,
            thread_name: "keystretch-worker".to_string(),
            enable_metrics: true,
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file cannot be read, `ConfigError::Parse`
    /// if it is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse from a JSON string; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` if `raw` is not valid JSON for this type.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply `KEYSTRETCH_*` environment overrides
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidEnv` if a set variable is not a number.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidEnv` if a present value is not a number.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(workers) = parse_var(&lookup, ENV_WORKERS)? {
            self.workers = workers;
        }
        if let Some(capacity) = parse_var(&lookup, ENV_QUEUE_CAPACITY)? {
            self.queue_capacity = capacity;
        }
        if let Some(max) = parse_var(&lookup, ENV_MAX_ITERATIONS)? {
            self.max_iterations = max;
        }
        Ok(self)
    }

    /// Reject settings the service cannot run with
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` for zero workers, zero queue capacity, a zero
    /// iteration limit, or a default iteration count outside the limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.default_iterations == 0 || self.default_iterations > self.max_iterations {
            return Err(ConfigError::Invalid(format!(
                "default_iterations must be between 1 and {}",
                self.max_iterations
            )));
        }
        Ok(())
    }

    /// Worker pool settings derived from this config
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            thread_name: self.thread_name.clone(),
            enable_metrics: self.enable_metrics,
        }
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
