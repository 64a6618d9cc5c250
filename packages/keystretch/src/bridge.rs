//! Host bridge: routes named actions with JSON arguments to the service
//!
//! Only `genKey` is routed. Its arguments are the JSON array
//! `[passphrase, salt, iterations, keySizeBits]`.

use crate::error::DerivationResult;
use crate::request::EncodedKey;
use crate::service::DerivationService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroize;

/// Action name for key derivation
pub const GEN_KEY: &str = "genKey";

/// Error code for argument arrays that do not match `genKey`
pub const INVALID_ARGUMENTS: &str = "INVALID_ARGUMENTS";

/// Response delivered to the host
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BridgeResponse {
    /// Derived key, base64
    Ok {
        /// Standard padded base64 key
        key: String,
    },
    /// Failure with a stable code and a human-readable message
    Error {
        /// Machine-readable code
        code: String,
        /// Description
        message: String,
    },
}

impl BridgeResponse {
    /// Error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Serialize to a single JSON line
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","code":"INTERNAL_FAILURE","message":"{e}"}}"#)
        })
    }
}

impl From<DerivationResult<EncodedKey>> for BridgeResponse {
    fn from(result: DerivationResult<EncodedKey>) -> Self {
        match result {
            Ok(key) => Self::Ok {
                key: key.expose().to_owned(),
            },
            Err(e) => Self::error(e.code(), e.to_string()),
        }
    }
}

impl Drop for BridgeResponse {
    fn drop(&mut self) {
        if let Self::Ok { key } = self {
            key.zeroize();
        }
    }
}

impl std::fmt::Debug for BridgeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok { .. } => f.debug_struct("Ok").field("key", &"<redacted>").finish(),
            Self::Error { code, message } => f
                .debug_struct("Error")
                .field("code", code)
                .field("message", message)
                .finish(),
        }
    }
}

#[derive(Deserialize)]
struct GenKeyArgs(String, String, i64, i64);

impl Drop for GenKeyArgs {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Dispatches host actions to a [`DerivationService`]
#[derive(Debug, Clone)]
pub struct PluginBridge {
    service: Arc<DerivationService>,
}

impl PluginBridge {
    /// Bridge onto `service`
    #[must_use]
    pub fn new(service: Arc<DerivationService>) -> Self {
        Self { service }
    }

    /// The service requests are routed to
    #[must_use]
    pub fn service(&self) -> &DerivationService {
        &self.service
    }

    /// Handle `action` with JSON `args`
    ///
    /// Returns `false` for unknown actions, in which case `callback` is never
    /// called. Otherwise `callback` receives exactly one response.
    pub fn execute<F>(&self, action: &str, args: &str, callback: F) -> bool
    where
        F: FnOnce(BridgeResponse) + Send + 'static,
    {
        if action != GEN_KEY {
            tracing::debug!(action, "unknown bridge action");
            return false;
        }

        let parsed: GenKeyArgs = match serde_json::from_str(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                callback(BridgeResponse::error(
                    INVALID_ARGUMENTS,
                    format!("expected [passphrase, salt, iterations, keySizeBits]: {e}"),
                ));
                return true;
            }
        };

        let GenKeyArgs(passphrase, salt, iterations, key_bits) = &parsed;
        self.service.request_derivation_with(
            passphrase,
            salt,
            *iterations,
            *key_bits,
            move |result| callback(BridgeResponse::from(result)),
        );
        true
    }
}
