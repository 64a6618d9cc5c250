//! Asynchronous derivation service
//!
//! Each request is validated, decoded, derived and encoded entirely on one
//! worker of a bounded pool. Callers block only while enqueueing, and the
//! `try_` variants do not block at all.

use crate::config::ServiceConfig;
use crate::error::{DerivationError, DerivationResult, StartError};
use crate::request::{DerivationRequest, EncodedKey};
use keystretch_async_task::{Completion, ExecutorMetrics, TaskHandle, TaskResult, WorkerPool};
use keystretch_common::LoggingTransformer;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Owner of the worker pool that runs derivations
///
/// Dropping the service finishes queued requests and joins the workers.
#[derive(Debug)]
pub struct DerivationService {
    pool: WorkerPool,
    config: ServiceConfig,
    next_request_id: AtomicU64,
}

impl DerivationService {
    /// Validate `config` and start the worker pool
    ///
    /// # Errors
    ///
    /// `StartError::Config` for invalid settings, `StartError::Pool` if the
    /// worker threads cannot be spawned.
    pub fn start(config: ServiceConfig) -> Result<Self, StartError> {
        config.validate()?;
        let pool = WorkerPool::start(config.executor_config())?;

        LoggingTransformer::log_pool_event("started", config.workers, config.queue_capacity);

        Ok(Self {
            pool,
            config,
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Start with [`ServiceConfig::default`]
    ///
    /// # Errors
    ///
    /// `StartError::Pool` if the worker threads cannot be spawned.
    pub fn with_defaults() -> Result<Self, StartError> {
        Self::start(ServiceConfig::default())
    }

    /// Derive a key, waiting for queue space if needed
    ///
    /// `encoded_salt` is standard padded base64. The future resolves to the
    /// base64 encoded key of `key_bits / 8` bytes.
    pub fn request_derivation(
        &self,
        passphrase: &str,
        encoded_salt: &str,
        iterations: i64,
        key_bits: i64,
    ) -> DerivationFuture {
        self.submit(DerivationRequest::new(
            passphrase,
            encoded_salt,
            iterations,
            key_bits,
        ))
    }

    /// Like [`DerivationService::request_derivation`] but fails with
    /// `InternalFailure` instead of waiting on a full queue
    pub fn try_request_derivation(
        &self,
        passphrase: &str,
        encoded_salt: &str,
        iterations: i64,
        key_bits: i64,
    ) -> DerivationFuture {
        self.try_submit(DerivationRequest::new(
            passphrase,
            encoded_salt,
            iterations,
            key_bits,
        ))
    }

    /// Derive a key and hand the outcome to `callback`, exactly once
    ///
    /// Blocks while the queue is full, except when called from inside another
    /// request's callback: there a full queue is reported to `callback` as
    /// `InternalFailure`.
    pub fn request_derivation_with<F>(
        &self,
        passphrase: &str,
        encoded_salt: &str,
        iterations: i64,
        key_bits: i64,
        callback: F,
    ) where
        F: FnOnce(DerivationResult<EncodedKey>) + Send + 'static,
    {
        let request = DerivationRequest::new(passphrase, encoded_salt, iterations, key_bits);
        let work = self.job(request);
        let _ = self.pool.submit_with(work, completion(callback));
    }

    /// Non-blocking [`DerivationService::request_derivation_with`]
    pub fn try_request_derivation_with<F>(
        &self,
        passphrase: &str,
        encoded_salt: &str,
        iterations: i64,
        key_bits: i64,
        callback: F,
    ) where
        F: FnOnce(DerivationResult<EncodedKey>) + Send + 'static,
    {
        let request = DerivationRequest::new(passphrase, encoded_salt, iterations, key_bits);
        let work = self.job(request);
        let _ = self.pool.try_submit_with(work, completion(callback));
    }

    /// Queue a prepared request
    pub fn submit(&self, request: DerivationRequest) -> DerivationFuture {
        DerivationFuture::new(self.pool.submit(self.job(request)))
    }

    /// Queue a prepared request without waiting for space
    pub fn try_submit(&self, request: DerivationRequest) -> DerivationFuture {
        DerivationFuture::new(self.pool.try_submit(self.job(request)))
    }

    /// Stop accepting requests, finish queued ones and join the workers
    ///
    /// Requests made afterwards fail with `InternalFailure`.
    pub fn shutdown(&self) {
        if self.pool.is_running() {
            self.pool.shutdown();
            LoggingTransformer::log_pool_event(
                "stopped",
                self.config.workers,
                self.config.queue_capacity,
            );
        }
    }

    /// Whether requests are still accepted
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pool.is_running()
    }

    /// Pool counters
    #[must_use]
    pub fn metrics(&self) -> ExecutorMetrics {
        self.pool.metrics()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn job(
        &self,
        request: DerivationRequest,
    ) -> impl FnOnce() -> DerivationResult<EncodedKey> + Send + use<> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let max_iterations = self.config.max_iterations;
        move || run(request_id, &request, max_iterations)
    }
}

impl Drop for DerivationService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    request_id: u64,
    request: &DerivationRequest,
    max_iterations: u32,
) -> DerivationResult<EncodedKey> {
    let started = Instant::now();

    let outcome = request.validate(max_iterations).and_then(|validated| {
        LoggingTransformer::log_derivation_request(
            request_id,
            request.iterations(),
            request.key_bits(),
            validated.salt(),
        );
        validated.derive(request.passphrase())
    });

    match &outcome {
        Ok(_) => LoggingTransformer::log_derivation_success(request_id, started.elapsed()),
        Err(e) => LoggingTransformer::log_derivation_failure(request_id, e.code(), started.elapsed()),
    }

    outcome
}

fn completion<F>(callback: F) -> Completion<DerivationResult<EncodedKey>>
where
    F: FnOnce(DerivationResult<EncodedKey>) + Send + 'static,
{
    Completion::new(move |outcome: TaskResult<DerivationResult<EncodedKey>>| {
        callback(flatten(outcome));
    })
}

fn flatten(outcome: TaskResult<DerivationResult<EncodedKey>>) -> DerivationResult<EncodedKey> {
    outcome
        .map_err(|e| keystretch_common::on_error(DerivationError::from(e)))
        .and_then(|result| result)
}

/// Pending result of a derivation request
///
/// Dropping it abandons the result; the derivation itself still runs.
pub struct DerivationFuture {
    handle: TaskHandle<DerivationResult<EncodedKey>>,
}

impl DerivationFuture {
    fn new(handle: TaskHandle<DerivationResult<EncodedKey>>) -> Self {
        Self { handle }
    }

    /// Wait at most `duration`
    ///
    /// # Errors
    ///
    /// `InternalFailure` if the derivation did not finish in time; its late
    /// result is discarded.
    pub async fn with_timeout(self, duration: Duration) -> DerivationResult<EncodedKey> {
        flatten(self.handle.with_timeout(duration).await)
    }
}

impl Future for DerivationFuture {
    type Output = DerivationResult<EncodedKey>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(flatten)
    }
}

impl std::fmt::Debug for DerivationFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationFuture").finish_non_exhaustive()
    }
}
