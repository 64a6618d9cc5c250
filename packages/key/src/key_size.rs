//! Key sizes the derivation service accepts

use crate::{KeyError, Result};

/// Output key sizes accepted at the service boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// 256-bit (32-byte) key
    Bits256,
    /// 512-bit (64-byte) key
    Bits512,
}

impl KeySize {
    /// Resolve a caller-supplied bit count
    ///
    /// # Errors
    ///
    /// Returns `KeyError::UnsupportedKeySize` for anything but 256 or 512.
    pub fn from_bits(bits: i64) -> Result<Self> {
        match bits {
            256 => Ok(Self::Bits256),
            512 => Ok(Self::Bits512),
            other => Err(KeyError::UnsupportedKeySize { bits: other }),
        }
    }

    /// Size in bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits256 => 256,
            Self::Bits512 => 512,
        }
    }

    /// Size in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Bits256 => 32,
            Self::Bits512 => 64,
        }
    }
}

impl std::fmt::Display for KeySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bits", self.bits())
    }
}
