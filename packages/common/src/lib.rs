//! Shared infrastructure for the keystretch crates
//!
//! - `env_logger` setup driven by `RUST_LOG`
//! - Redacting log helpers for derivation requests
//! - Default `on_result` / `on_error` pass-through handlers

pub mod handlers;
pub mod logging;

pub use handlers::{on_error, on_result};
pub use logging::{LoggingTransformer, fingerprint};
