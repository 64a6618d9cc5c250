//! # keystretch key derivation
//!
//! PBKDF2 over the from-scratch HMAC-SHA256 in `keystretch_hashing`.
//!
//! ```rust,ignore
//! use keystretch_key::{KdfConfig, KeyDerivation, KeySize};
//!
//! let kdf = KeyDerivation::new(KdfConfig::for_key_size(50_000, KeySize::Bits256))
//!     .with_salt(b"salt".to_vec());
//! let key = kdf.derive_key(b"password")?;
//! assert_eq!(key.len(), 32);
//! ```

#![forbid(unsafe_code)]

pub mod derive;
pub mod derived_key;
pub mod entropy;
pub mod error;
pub mod key_size;

pub use derive::{
    KdfConfig, KeyDerivation, MAX_OUTPUT_LEN, PBKDF2_ALGORITHM, PBKDF2_HASH, PBKDF2_ITER_DEFAULT,
    PBKDF2_ITER_MAX, Pbkdf2Params, constant_time_compare, pbkdf2_hmac_sha256,
};
pub use derived_key::DerivedKey;
pub use entropy::{DEFAULT_SALT_LEN, generate_salt};
pub use error::{KeyError, Result};
pub use key_size::KeySize;
