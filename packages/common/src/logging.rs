//! `env_logger` based logging with redaction of sensitive inputs
//!
//! Derivation requests are logged by id, iteration count, key size and salt
//! length. Salts show up only as a short SHA-256 fingerprint. Passphrases and
//! derived keys have no logging entry point at all.

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

const FINGERPRINT_HEX_LEN: usize = 12;

/// Logging setup and structured log helpers
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging once at application startup
    ///
    /// Levels come from `RUST_LOG`, e.g.
    /// `RUST_LOG=keystretch=debug,keystretch_async_task=info`.
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for tests; safe to call repeatedly
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log an accepted derivation request
    pub fn log_derivation_request(request_id: u64, iterations: i64, key_bits: i64, salt: &[u8]) {
        debug!(
            "Derivation #{request_id} started (iterations: {iterations}, key_bits: {key_bits}, salt_len: {}, salt: {})",
            salt.len(),
            fingerprint(salt)
        );
    }

    /// Log a finished derivation
    pub fn log_derivation_success(request_id: u64, elapsed: Duration) {
        debug!(
            "Derivation #{request_id} completed in {}ms",
            elapsed.as_millis()
        );
    }

    /// Log a failed derivation by error code only
    pub fn log_derivation_failure(request_id: u64, code: &str, elapsed: Duration) {
        warn!(
            "Derivation #{request_id} failed with {code} after {}ms",
            elapsed.as_millis()
        );
    }

    /// Log worker pool lifecycle events
    pub fn log_pool_event(event: &str, workers: usize, queue_capacity: usize) {
        info!("Worker pool {event} (workers: {workers}, queue_capacity: {queue_capacity})");
    }
}

/// Short, stable SHA-256 fingerprint of `data` for log lines
///
/// `#` followed by the first 12 hex characters of the digest.
#[must_use]
pub fn fingerprint(data: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(data));
    format!("#{}", &digest[..FINGERPRINT_HEX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_short_and_stable() {
        let first = fingerprint(b"salt");
        assert_eq!(first, fingerprint(b"salt"));
        assert_ne!(first, fingerprint(b"pepper"));
        assert!(first.starts_with('#'));
        assert_eq!(first.len(), 13);
    }

    #[test]
    fn fingerprint_of_empty_input() {
        // SHA-256("") = e3b0c442...
        assert_eq!(fingerprint(b""), "#e3b0c44298fc");
    }

    #[test]
    fn logging_helpers_do_not_panic() {
        LoggingTransformer::init_test();

        LoggingTransformer::log_derivation_request(1, 1000, 256, b"salt");
        LoggingTransformer::log_derivation_success(1, Duration::from_millis(3));
        LoggingTransformer::log_derivation_failure(2, "MALFORMED_SALT", Duration::ZERO);
        LoggingTransformer::log_pool_event("started", 4, 64);
    }
}
