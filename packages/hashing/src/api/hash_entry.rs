//! Entry point for the fluent hashing API

use super::sha256_builder::Sha256Builder;

/// Entry point for hash operations
pub struct Hash;

impl Hash {
    /// Use SHA-256, or HMAC-SHA256 once a key is attached
    #[must_use]
    pub fn sha256() -> Sha256Builder {
        Sha256Builder::new()
    }
}
