//! A single derivation request and its validation

use crate::error::{DerivationError, DerivationResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use keystretch_key::{KdfConfig, KeyDerivation, KeySize, constant_time_compare};
use zeroize::Zeroizing;

/// Inputs of one derivation, as received from the caller
///
/// Nothing is checked at construction; [`DerivationRequest::validate`] runs
/// on the worker so the caller never pays for it.
pub struct DerivationRequest {
    passphrase: Zeroizing<String>,
    encoded_salt: Zeroizing<String>,
    iterations: i64,
    key_bits: i64,
}

/// A request that passed validation, with its salt decoded
pub struct ValidatedRequest {
    key_size: KeySize,
    iterations: u32,
    salt: Zeroizing<Vec<u8>>,
}

impl DerivationRequest {
    /// Capture a request
    pub fn new(
        passphrase: impl Into<String>,
        encoded_salt: impl Into<String>,
        iterations: i64,
        key_bits: i64,
    ) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
            encoded_salt: Zeroizing::new(encoded_salt.into()),
            iterations,
            key_bits,
        }
    }

    /// Iteration count as requested
    #[must_use]
    pub fn iterations(&self) -> i64 {
        self.iterations
    }

    /// Key size in bits as requested
    #[must_use]
    pub fn key_bits(&self) -> i64 {
        self.key_bits
    }

    pub(crate) fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Validate in order: key size, iteration count, salt encoding
    ///
    /// # Errors
    ///
    /// The first failing check, as `UnsupportedKeySize`,
    /// `InvalidIterationCount` or `MalformedSalt`.
    pub fn validate(&self, max_iterations: u32) -> DerivationResult<ValidatedRequest> {
        let key_size = KeySize::from_bits(self.key_bits)?;

        let iterations = u32::try_from(self.iterations)
            .ok()
            .filter(|n| (1..=max_iterations).contains(n))
            .ok_or(DerivationError::InvalidIterationCount {
                iterations: self.iterations,
                max: max_iterations,
            })?;

        let salt = STANDARD
            .decode(self.encoded_salt.as_bytes())
            .map(Zeroizing::new)
            .map_err(|e| DerivationError::MalformedSalt(e.to_string()))?;

        Ok(ValidatedRequest {
            key_size,
            iterations,
            salt,
        })
    }

    /// Validate, derive and base64-encode the key on the current thread
    ///
    /// # Errors
    ///
    /// Validation errors, or `InternalFailure` if the engine rejects the
    /// parameters.
    pub fn derive(&self, max_iterations: u32) -> DerivationResult<EncodedKey> {
        self.validate(max_iterations)?.derive(&self.passphrase)
    }
}

impl std::fmt::Debug for DerivationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationRequest")
            .field("iterations", &self.iterations)
            .field("key_bits", &self.key_bits)
            .finish_non_exhaustive()
    }
}

impl ValidatedRequest {
    /// Accepted key size
    #[must_use]
    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Accepted iteration count
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Decoded salt bytes
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Run PBKDF2 and encode the key
    ///
    /// # Errors
    ///
    /// `InternalFailure` if the engine rejects the parameters.
    pub fn derive(&self, passphrase: &str) -> DerivationResult<EncodedKey> {
        let kdf = KeyDerivation::new(KdfConfig::for_key_size(self.iterations, self.key_size))
            .with_salt(self.salt.to_vec());
        let key = kdf.derive_key(passphrase.as_bytes())?;
        Ok(EncodedKey(key.to_base64()))
    }
}

/// Base64 (standard alphabet, padded) encoding of a derived key
///
/// Wiped on drop and never shown by `Debug`.
#[derive(Clone)]
pub struct EncodedKey(Zeroizing<String>);

impl EncodedKey {
    /// The base64 text
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Take the base64 text out
    #[must_use]
    pub fn into_inner(self) -> Zeroizing<String> {
        self.0
    }

    /// Decode back to raw key bytes
    ///
    /// # Errors
    ///
    /// `InternalFailure` if the text is not valid base64.
    pub fn decode(&self) -> DerivationResult<Zeroizing<Vec<u8>>> {
        STANDARD
            .decode(self.0.as_bytes())
            .map(Zeroizing::new)
            .map_err(|e| DerivationError::internal(e.to_string()))
    }
}

impl PartialEq for EncodedKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_compare(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for EncodedKey {}

impl std::fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncodedKey").field(&"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_order_key_size_first() {
        let req = DerivationRequest::new("pw", "%%%", 0, 128);
        assert_eq!(
            req.validate(1_000).err(),
            Some(DerivationError::UnsupportedKeySize { bits: 128 })
        );
    }

    #[test]
    fn validation_order_iterations_before_salt() {
        let req = DerivationRequest::new("pw", "%%%", 0, 256);
        assert!(matches!(
            req.validate(1_000),
            Err(DerivationError::InvalidIterationCount { iterations: 0, .. })
        ));

        let req = DerivationRequest::new("pw", "%%%", 1_001, 512);
        assert!(matches!(
            req.validate(1_000),
            Err(DerivationError::InvalidIterationCount { max: 1_000, .. })
        ));
    }

    #[test]
    fn negative_iterations_are_rejected() {
        let req = DerivationRequest::new("pw", "c2FsdA==", -5, 256);
        assert!(matches!(
            req.validate(1_000),
            Err(DerivationError::InvalidIterationCount { iterations: -5, .. })
        ));
    }

    #[test]
    fn unpadded_salt_is_malformed() {
        let req = DerivationRequest::new("pw", "c2FsdA", 1, 256);
        assert!(matches!(
            req.validate(1_000),
            Err(DerivationError::MalformedSalt(_))
        ));
    }

    #[test]
    fn empty_salt_is_accepted() {
        let validated = DerivationRequest::new("pw", "", 1, 256)
            .validate(1_000)
            .expect("empty base64 decodes to an empty salt");
        assert!(validated.salt().is_empty());
    }

    #[test]
    fn debug_hides_secrets() {
        let req = DerivationRequest::new("hunter2", "c2FsdA==", 1, 256);
        let shown = format!("{req:?}");
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("c2FsdA=="));

        let key = req.derive(10).expect("derive");
        assert!(!format!("{key:?}").contains(key.expose()));
    }
}
