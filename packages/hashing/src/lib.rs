//! HMAC-SHA256 pseudorandom function and async hashing helpers
//!
//! [`prf`] is the synchronous primitive used by the key derivation engine.
//! [`Hash`] offers the same computations off the calling task:
//!
//! ```rust,ignore
//! use keystretch_hashing::Hash;
//!
//! let tag = Hash::sha256().with_key(b"key".to_vec()).compute(b"message".to_vec()).await?;
//! assert_eq!(tag.len(), 32);
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod async_result;
pub mod error;
pub mod hash_result;
pub mod prf;

pub use api::{Hash, Sha256Builder, Sha256BuilderWithKey};
pub use async_result::{AsyncHashResult, AsyncHashResultWithHandler};
pub use error::{HashError, Result};
pub use hash_result::HashResult;
pub use prf::{BLOCK_SIZE, HmacSha256, OUTPUT_SIZE, prf};
