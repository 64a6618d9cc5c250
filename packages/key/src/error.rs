//! Error handling for the key derivation engine

use thiserror::Error;

/// Key derivation errors
#[derive(Debug, Error)]
pub enum KeyError {
    /// Iteration count is zero, negative, or above the accepted maximum
    #[error("Invalid iteration count {iterations}: must be between 1 and {max}")]
    InvalidIterationCount {
        /// Iteration count as supplied by the caller
        iterations: i64,
        /// Largest accepted iteration count
        max: u32,
    },

    /// PBKDF2 needs at least one PRF application per block
    #[error("Invalid iteration count 0: at least one iteration is required")]
    ZeroIterations,

    /// Requested key size is not one of the supported sizes
    #[error("Unsupported key size: {bits} bits (expected 256 or 512)")]
    UnsupportedKeySize {
        /// Key size in bits as supplied by the caller
        bits: i64,
    },

    /// Requested output exceeds the PBKDF2 limit of (2^32 - 1) blocks
    #[error("Derived key too long: {requested} bytes requested")]
    OutputTooLong {
        /// Requested output length in bytes
        requested: usize,
    },

    /// Parameter set names an algorithm or hash other than PBKDF2 with SHA-256
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Salt is missing or not valid base64
    #[error("Malformed salt: {0}")]
    MalformedSalt(String),

    /// Internal error occurred
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KeyError {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for key operations
pub type Result<T> = std::result::Result<T, KeyError>;
