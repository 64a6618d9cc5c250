//! # keystretch
//!
//! Passphrase-based key derivation (PBKDF2 with HMAC-SHA256) as an
//! asynchronous service. Requests run on a bounded pool of worker threads;
//! results come back as a future or through a callback invoked exactly once.
//!
//! ```rust,ignore
//! use keystretch::{DerivationService, ServiceConfig};
//!
//! let service = DerivationService::start(ServiceConfig::default())?;
//! let key = service
//!     .request_derivation("password", "c2FsdA==", 50_000, 256)
//!     .await?;
//! println!("{}", key.expose());
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod request;
pub mod service;

pub use bridge::{BridgeResponse, GEN_KEY, INVALID_ARGUMENTS, PluginBridge};
pub use config::ServiceConfig;
pub use error::{ConfigError, DerivationError, DerivationResult, StartError};
pub use request::{DerivationRequest, EncodedKey, ValidatedRequest};
pub use service::{DerivationFuture, DerivationService};

pub use keystretch_async_task::ExecutorMetrics;
pub use keystretch_key::{KeySize, Pbkdf2Params};
