//! SHA-256 and HMAC-SHA256 builders
//!
//! Computation is moved off the calling task with `spawn_blocking` when a
//! tokio runtime is available and onto a short-lived thread otherwise; the
//! returned [`AsyncHashResult`] resolves once the digest is ready.

use crate::prf::HmacSha256;
use crate::{AsyncHashResult, HashError, HashResult, Result};
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use zeroize::Zeroizing;

/// SHA-256 hash builder
#[derive(Clone, Default)]
pub struct Sha256Builder;

/// SHA-256 hash builder with an HMAC key
pub struct Sha256BuilderWithKey {
    key: Zeroizing<Vec<u8>>,
}

impl Sha256Builder {
    /// Create new SHA-256 builder
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Attach an HMAC key; `compute` then produces HMAC-SHA256 tags
    #[must_use]
    pub fn with_key<K: Into<Vec<u8>>>(self, key: K) -> Sha256BuilderWithKey {
        Sha256BuilderWithKey {
            key: Zeroizing::new(key.into()),
        }
    }

    /// Compute the plain SHA-256 digest of `data`
    #[must_use]
    pub fn compute<T: Into<Vec<u8>>>(self, data: T) -> AsyncHashResult {
        let data = data.into();
        spawn_hash(move || Ok(HashResult::from(<[u8; 32]>::from(Sha256::digest(&data)))))
    }
}

impl Sha256BuilderWithKey {
    /// Compute HMAC-SHA256 of `data` under the attached key
    #[must_use]
    pub fn compute<T: Into<Vec<u8>>>(self, data: T) -> AsyncHashResult {
        let data = Zeroizing::new(data.into());
        let key = self.key;
        spawn_hash(move || Ok(HashResult::from(HmacSha256::new(&key).tag(&data))))
    }
}

impl std::fmt::Debug for Sha256BuilderWithKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256BuilderWithKey").finish_non_exhaustive()
    }
}

fn spawn_hash<F>(work: F) -> AsyncHashResult
where
    F: FnOnce() -> Result<HashResult> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let job = move || {
        let result = work();
        if tx.send(result).is_err() {
            tracing::trace!("hash result receiver dropped");
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => {
            let spawned = std::thread::Builder::new()
                .name("keystretch-hash".to_string())
                .spawn(job);
            if let Err(e) = spawned {
                return AsyncHashResult::ready(Err(HashError::internal(format!(
                    "failed to spawn hash thread: {e}"
                ))));
            }
        }
    }

    AsyncHashResult::new(rx)
}
