//! Core PBKDF2-HMAC-SHA256 implementation
//!
//! Each output block `i` (1-based) is
//! `T_i = U_1 ^ U_2 ^ ... ^ U_c` where `U_1 = PRF(P, S || INT_BE32(i))` and
//! `U_j = PRF(P, U_{j-1})`. Blocks are concatenated and truncated to the
//! requested length. Work is linear in the iteration count and nothing is
//! cached between calls.

use super::config::KdfConfig;
use super::utils::constant_time_compare;
use crate::entropy::generate_salt;
use crate::{DerivedKey, KeyError, Result};
use keystretch_hashing::{HmacSha256, OUTPUT_SIZE};
use zeroize::Zeroizing;

/// Largest output PBKDF2 can produce: (2^32 - 1) blocks of 32 bytes
pub const MAX_OUTPUT_LEN: u64 = u32::MAX as u64 * OUTPUT_SIZE as u64;

/// Fill `output` with PBKDF2-HMAC-SHA256(`passphrase`, `salt`, `iterations`)
///
/// # Errors
///
/// - `KeyError::ZeroIterations` if `iterations` is zero
/// - `KeyError::OutputTooLong` if `output` exceeds [`MAX_OUTPUT_LEN`]
pub fn pbkdf2_hmac_sha256(
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    output: &mut [u8],
) -> Result<()> {
    if iterations == 0 {
        return Err(KeyError::ZeroIterations);
    }

    let requested = output.len();
    if requested as u64 > MAX_OUTPUT_LEN {
        return Err(KeyError::OutputTooLong { requested });
    }

    // Keyed once per derivation; every block starts from a clone of this state.
    let prf = HmacSha256::new(passphrase);

    for (index, chunk) in output.chunks_mut(OUTPUT_SIZE).enumerate() {
        let block_index =
            u32::try_from(index + 1).map_err(|_| KeyError::OutputTooLong { requested })?;
        let block = derive_block(&prf, salt, iterations, block_index);
        chunk.copy_from_slice(&block[..chunk.len()]);
    }

    Ok(())
}

fn derive_block(
    prf: &HmacSha256,
    salt: &[u8],
    iterations: u32,
    block_index: u32,
) -> Zeroizing<[u8; OUTPUT_SIZE]> {
    let mut ctx = prf.clone();
    ctx.update(salt);
    ctx.update(&block_index.to_be_bytes());

    let mut u = Zeroizing::new(ctx.finalize());
    let mut t = Zeroizing::new(*u);

    for _ in 1..iterations {
        let next = Zeroizing::new(prf.tag(u.as_slice()));
        u.copy_from_slice(next.as_slice());
        for (acc, byte) in t.iter_mut().zip(u.iter()) {
            *acc ^= byte;
        }
    }

    t
}

/// Key derivation context holding a salt and parameters
///
/// The salt is wiped when the context is dropped.
pub struct KeyDerivation {
    config: KdfConfig,
    salt: Option<Zeroizing<Vec<u8>>>,
}

impl KeyDerivation {
    /// Create a new key derivation context
    #[must_use]
    pub fn new(config: KdfConfig) -> Self {
        Self { config, salt: None }
    }

    /// Set the salt
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(Zeroizing::new(salt.into()));
        self
    }

    /// Use a fresh random salt of `len` bytes
    #[must_use]
    pub fn with_random_salt(mut self, len: usize) -> Self {
        self.salt = Some(generate_salt(len));
        self
    }

    /// Derive a key from `input`
    ///
    /// # Errors
    ///
    /// - `KeyError::MalformedSalt` if no salt was set
    /// - any error from [`pbkdf2_hmac_sha256`]
    pub fn derive_key(&self, input: &[u8]) -> Result<DerivedKey> {
        let salt = self
            .salt
            .as_ref()
            .ok_or_else(|| KeyError::MalformedSalt("salt not provided".to_string()))?;

        let mut output = Zeroizing::new(vec![0u8; self.config.output_size]);
        pbkdf2_hmac_sha256(input, salt, self.config.iterations, &mut output)?;

        tracing::trace!(
            iterations = self.config.iterations,
            output_size = self.config.output_size,
            "derived key"
        );

        Ok(DerivedKey::new(output))
    }

    /// Re-derive from `input` and compare with `expected` in constant time
    ///
    /// # Errors
    ///
    /// Propagates derivation errors; a mismatch is `Ok(false)`.
    pub fn verify(&self, input: &[u8], expected: &[u8]) -> Result<bool> {
        let derived = self.derive_key(input)?;
        Ok(constant_time_compare(derived.as_bytes(), expected))
    }

    /// Get the current salt (if set)
    #[must_use]
    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_ref().map(|s| s.as_slice())
    }

    /// Get the KDF configuration
    #[must_use]
    pub fn config(&self) -> &KdfConfig {
        &self.config
    }
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::new(KdfConfig::default())
    }
}
