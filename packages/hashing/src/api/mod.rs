//! Fluent hashing API
//!
//! Usage: `Hash::sha256().with_key(key).compute(data).await`

pub mod hash_entry;
pub mod sha256_builder;

pub use hash_entry::Hash;
pub use sha256_builder::{Sha256Builder, Sha256BuilderWithKey};
