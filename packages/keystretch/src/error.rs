//! Error taxonomy of the derivation service

use keystretch_async_task::TaskError;
use keystretch_key::{KeyError, PBKDF2_ITER_MAX};
use thiserror::Error;

/// Terminal outcome of a failed derivation request
///
/// Every variant is delivered to the caller exactly once; none are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// Requested key size is neither 256 nor 512 bits
    #[error("Unsupported key size: {bits} bits (expected 256 or 512)")]
    UnsupportedKeySize {
        /// Key size as requested
        bits: i64,
    },

    /// Iteration count is below 1 or above the configured maximum
    #[error("Invalid iteration count {iterations}: must be between 1 and {max}")]
    InvalidIterationCount {
        /// Iteration count as requested
        iterations: i64,
        /// Configured maximum
        max: u32,
    },

    /// Salt is not standard padded base64
    #[error("Malformed salt: {0}")]
    MalformedSalt(String),

    /// Anything else: worker panic, pool shut down or full, abandoned result
    #[error("Internal failure: {0}")]
    InternalFailure(String),
}

impl DerivationError {
    /// Stable machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedKeySize { .. } => "UNSUPPORTED_KEY_SIZE",
            Self::InvalidIterationCount { .. } => "INVALID_ITERATION_COUNT",
            Self::MalformedSalt(_) => "MALFORMED_SALT",
            Self::InternalFailure(_) => "INTERNAL_FAILURE",
        }
    }

    /// Create an internal failure
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalFailure(msg.into())
    }
}

impl From<KeyError> for DerivationError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::UnsupportedKeySize { bits } => Self::UnsupportedKeySize { bits },
            KeyError::InvalidIterationCount { iterations, max } => {
                Self::InvalidIterationCount { iterations, max }
            }
            KeyError::ZeroIterations => Self::InvalidIterationCount {
                iterations: 0,
                max: PBKDF2_ITER_MAX,
            },
            KeyError::MalformedSalt(msg) => Self::MalformedSalt(msg),
            other @ (KeyError::OutputTooLong { .. }
            | KeyError::UnsupportedAlgorithm(_)
            | KeyError::Internal(_)) => Self::InternalFailure(other.to_string()),
        }
    }
}

impl From<TaskError> for DerivationError {
    fn from(err: TaskError) -> Self {
        Self::InternalFailure(err.to_string())
    }
}

/// Errors from loading or validating [`crate::ServiceConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::ServiceConfig`]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Environment override does not parse as a number
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// Config values are out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from starting a [`crate::DerivationService`]
#[derive(Debug, Error)]
pub enum StartError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Worker threads could not be spawned
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] TaskError),
}

/// Result type for derivation requests
pub type DerivationResult<T> = std::result::Result<T, DerivationError>;
