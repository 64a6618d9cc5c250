//! Key Derivation Function Configuration

use super::params::PBKDF2_ITER_DEFAULT;
use crate::KeySize;

/// Parameters for one PBKDF2 derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfConfig {
    /// Number of PRF applications per output block
    pub iterations: u32,
    /// Output key size in bytes
    pub output_size: usize,
}

impl KdfConfig {
    /// Create a configuration with explicit parameters
    #[must_use]
    pub fn new(iterations: u32, output_size: usize) -> Self {
        Self {
            iterations,
            output_size,
        }
    }

    /// Configuration producing a key of one of the service key sizes
    #[must_use]
    pub fn for_key_size(iterations: u32, key_size: KeySize) -> Self {
        Self::new(iterations, key_size.bytes())
    }

    /// Default host application parameters: 50 000 iterations, 256-bit key
    #[must_use]
    pub fn standard() -> Self {
        Self::for_key_size(PBKDF2_ITER_DEFAULT, KeySize::Bits256)
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self::standard()
    }
}
