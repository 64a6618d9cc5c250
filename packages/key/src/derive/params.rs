//! Serializable PBKDF2 parameter sets as stored alongside encrypted data

use crate::entropy::{DEFAULT_SALT_LEN, generate_salt};
use crate::{KeyError, KeySize, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Default number of PBKDF2 iterations
pub const PBKDF2_ITER_DEFAULT: u32 = 50_000;

/// Maximum accepted number of PBKDF2 iterations
pub const PBKDF2_ITER_MAX: u32 = 10_000_000;

/// Algorithm name carried in serialized parameter sets
pub const PBKDF2_ALGORITHM: &str = "PBKDF2";

/// Hash name carried in serialized parameter sets
pub const PBKDF2_HASH: &str = "SHA-256";

fn default_algorithm() -> String {
    PBKDF2_ALGORITHM.to_string()
}

fn default_hash() -> String {
    PBKDF2_HASH.to_string()
}

/// PBKDF2 parameters in their wire form (base64 salt, key size in bits)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pbkdf2Params {
    /// Always `"PBKDF2"`
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Always `"SHA-256"`
    #[serde(default = "default_hash")]
    pub hash: String,
    /// Derived key size in bits
    pub key_size: u32,
    /// Iteration count
    pub iterations: u32,
    /// Standard base64 salt; empty until one is generated
    pub salt: String,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            hash: default_hash(),
            key_size: KeySize::Bits256.bits(),
            iterations: PBKDF2_ITER_DEFAULT,
            salt: String::new(),
        }
    }
}

impl Pbkdf2Params {
    /// Replace the salt with [`DEFAULT_SALT_LEN`] fresh random bytes
    #[must_use]
    pub fn with_random_salt(mut self) -> Self {
        self.salt = STANDARD.encode(generate_salt(DEFAULT_SALT_LEN).as_slice());
        self
    }

    /// Check the parameter set and return its key size
    ///
    /// # Errors
    ///
    /// - `KeyError::UnsupportedAlgorithm` unless the set names PBKDF2 with SHA-256
    /// - `KeyError::UnsupportedKeySize` if `key_size` is not 256 or 512
    /// - `KeyError::InvalidIterationCount` outside `1..=PBKDF2_ITER_MAX`
    /// - `KeyError::MalformedSalt` if the salt is empty or not base64
    pub fn validate(&self) -> Result<KeySize> {
        if self.algorithm != PBKDF2_ALGORITHM || self.hash != PBKDF2_HASH {
            return Err(KeyError::UnsupportedAlgorithm(format!(
                "{} with {}",
                self.algorithm, self.hash
            )));
        }

        let key_size = KeySize::from_bits(i64::from(self.key_size))?;

        if self.iterations == 0 || self.iterations > PBKDF2_ITER_MAX {
            return Err(KeyError::InvalidIterationCount {
                iterations: i64::from(self.iterations),
                max: PBKDF2_ITER_MAX,
            });
        }

        if self.salt.is_empty() {
            return Err(KeyError::MalformedSalt("salt is empty".to_string()));
        }
        self.decoded_salt()?;

        Ok(key_size)
    }

    /// Decode the base64 salt
    ///
    /// # Errors
    ///
    /// Returns `KeyError::MalformedSalt` if the salt is not standard padded base64.
    pub fn decoded_salt(&self) -> Result<Zeroizing<Vec<u8>>> {
        STANDARD
            .decode(&self.salt)
            .map(Zeroizing::new)
            .map_err(|e| KeyError::MalformedSalt(e.to_string()))
    }
}
