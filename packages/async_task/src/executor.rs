//! Bounded worker pool
//!
//! Jobs are pushed onto a bounded MPMC queue and picked up by a fixed number
//! of named OS threads. A job runs to completion on the thread that picked it
//! up; there are no suspension points inside it.
//!
//! A worker never blocks on its own pool's queue. Blocking enqueues issued
//! from one of the pool's workers (typically from inside a completion
//! callback) fall back to a non-blocking attempt and report
//! `TaskError::QueueFull` when there is no room.

use crate::task::panic_message;
use crate::{Completion, TaskError, TaskHandle, TaskResult};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce() + Send + 'static>;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Id of the pool whose worker is running on this thread.
    static CURRENT_POOL: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Jobs that may wait in the queue before `execute` blocks
    pub queue_capacity: usize,
    /// Worker thread name prefix
    pub thread_name: String,
    /// Track job counters
    pub enable_metrics: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
            thread_name: "worker".to_string(),
            enable_metrics: false,
        }
    }
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorMetrics {
    /// Jobs accepted onto the queue
    pub tasks_submitted: u64,
    /// Jobs that ran to completion
    pub tasks_executed: u64,
    /// Jobs that panicked
    pub tasks_panicked: u64,
    /// Jobs refused because the queue was full or the pool shut down
    pub tasks_rejected: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    executed: AtomicU64,
    panicked: AtomicU64,
    rejected: AtomicU64,
}

/// Fixed-size pool of worker threads
///
/// Dropping the pool shuts it down: queued jobs are drained and the workers
/// joined.
pub struct WorkerPool {
    id: u64,
    config: ExecutorConfig,
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Spawn the worker threads
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Spawn` if a thread cannot be created. Threads
    /// already started are shut down again.
    pub fn start(config: ExecutorConfig) -> TaskResult<Self> {
        let workers = config.workers.max(1);
        let (sender, receiver) = crossbeam_channel::bounded::<Job>(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());

        let pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            config,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(Vec::with_capacity(workers)),
            counters,
        };

        for index in 0..workers {
            let receiver = receiver.clone();
            let counters = Arc::clone(&pool.counters);
            let track = pool.config.enable_metrics;
            let pool_id = pool.id;
            let spawned = std::thread::Builder::new()
                .name(format!("{}-{index}", pool.config.thread_name))
                .spawn(move || worker_loop(pool_id, &receiver, &counters, track));

            match spawned {
                Ok(handle) => pool.lock_workers().push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(TaskError::Spawn(e.to_string()));
                }
            }
        }

        tracing::debug!(
            workers,
            queue_capacity = pool.config.queue_capacity,
            "worker pool started"
        );

        Ok(pool)
    }

    /// Enqueue `job`, blocking while the queue is full
    ///
    /// Called from one of this pool's own workers it does not block and
    /// behaves like [`WorkerPool::try_execute`].
    ///
    /// # Errors
    ///
    /// Returns `TaskError::ShutDown` if the pool has been shut down, or
    /// `TaskError::QueueFull` if a worker of this pool found the queue full.
    /// The job is dropped without running.
    pub fn execute<F>(&self, job: F) -> TaskResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.on_own_worker() {
            return self.try_execute(job);
        }
        let sender = self.sender()?;
        match sender.send(Box::new(job)) {
            Ok(()) => {
                self.record(&self.counters.submitted);
                Ok(())
            }
            Err(_) => {
                self.record(&self.counters.rejected);
                Err(TaskError::ShutDown)
            }
        }
    }

    /// Enqueue `job` only if there is room right now
    ///
    /// # Errors
    ///
    /// Returns `TaskError::QueueFull` or `TaskError::ShutDown`; the job is
    /// dropped without running.
    pub fn try_execute<F>(&self, job: F) -> TaskResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender()?;
        match sender.try_send(Box::new(job)) {
            Ok(()) => {
                self.record(&self.counters.submitted);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.record(&self.counters.rejected);
                Err(TaskError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.record(&self.counters.rejected);
                Err(TaskError::ShutDown)
            }
        }
    }

    /// Run `work` on a worker and get its result as a future
    ///
    /// Blocks only while the queue is full, and never on one of this pool's
    /// workers. A panic inside `work` resolves the handle with
    /// `TaskError::Panicked`.
    pub fn submit<T, F>(&self, work: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        match self.execute(move || {
            let _ = tx.send(run_caught(work));
        }) {
            Ok(()) => TaskHandle::new(rx),
            Err(e) => TaskHandle::ready(Err(e)),
        }
    }

    /// Like [`WorkerPool::submit`] but never blocks
    pub fn try_submit<T, F>(&self, work: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        match self.try_execute(move || {
            let _ = tx.send(run_caught(work));
        }) {
            Ok(()) => TaskHandle::new(rx),
            Err(e) => TaskHandle::ready(Err(e)),
        }
    }

    /// Run `work` on a worker and deliver its result to `completion`
    ///
    /// The completion fires exactly once: with the result, with
    /// `TaskError::Panicked`, or with the enqueue error if the job was
    /// refused. Blocks only while the queue is full; on one of this pool's
    /// own workers a full queue is delivered as `TaskError::QueueFull`.
    ///
    /// # Errors
    ///
    /// Returns the enqueue error after it has been delivered to `completion`.
    pub fn submit_with<T, F>(&self, work: F, completion: Completion<T>) -> TaskResult<()>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.dispatch_with(work, completion, true)
    }

    /// Like [`WorkerPool::submit_with`] but never blocks
    ///
    /// # Errors
    ///
    /// Returns `TaskError::QueueFull` or `TaskError::ShutDown` after
    /// delivering it to `completion`.
    pub fn try_submit_with<T, F>(&self, work: F, completion: Completion<T>) -> TaskResult<()>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.dispatch_with(work, completion, false)
    }

    fn dispatch_with<T, F>(&self, work: F, completion: Completion<T>, block: bool) -> TaskResult<()>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        // Shared so a refused job can still hand the completion back.
        let slot = Arc::new(Mutex::new(Some(completion)));
        let job_slot = Arc::clone(&slot);
        let job = move || {
            let completion = job_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(completion) = completion {
                completion.complete(run_caught(work));
            }
        };

        let enqueued = if block {
            self.execute(job)
        } else {
            self.try_execute(job)
        };

        if let Err(e) = &enqueued {
            let completion = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(completion) = completion {
                completion.complete(Err(e.clone()));
            }
        }

        enqueued
    }

    /// Stop accepting work, drain the queue and join the workers
    ///
    /// Idempotent. When called from one of the pool's own workers that
    /// thread is not joined.
    pub fn shutdown(&self) {
        let closed = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        let handles: Vec<JoinHandle<()>> = self.lock_workers().drain(..).collect();
        let current = std::thread::current().id();

        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("worker thread exited abnormally");
            }
        }

        if closed {
            tracing::debug!("worker pool shut down");
        }
    }

    /// Whether the pool still accepts work
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of jobs waiting in the queue
    #[must_use]
    pub fn queued(&self) -> usize {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, Sender::len)
    }

    /// Pool configuration
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Current counters; all zero unless `enable_metrics` is set
    #[must_use]
    pub fn metrics(&self) -> ExecutorMetrics {
        ExecutorMetrics {
            tasks_submitted: self.counters.submitted.load(Ordering::Relaxed),
            tasks_executed: self.counters.executed.load(Ordering::Relaxed),
            tasks_panicked: self.counters.panicked.load(Ordering::Relaxed),
            tasks_rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    /// Whether the calling thread is one of this pool's workers
    #[must_use]
    pub fn on_own_worker(&self) -> bool {
        CURRENT_POOL.with(Cell::get) == Some(self.id)
    }

    fn sender(&self) -> TaskResult<Sender<Job>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TaskError::ShutDown)
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, counter: &AtomicU64) {
        if self.config.enable_metrics {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn run_caught<T, F>(work: F) -> TaskResult<T>
where
    F: FnOnce() -> T,
{
    catch_unwind(AssertUnwindSafe(work)).map_err(|payload| TaskError::Panicked(panic_message(&*payload)))
}

fn worker_loop(pool_id: u64, receiver: &Receiver<Job>, counters: &Counters, track: bool) {
    CURRENT_POOL.with(|current| current.set(Some(pool_id)));
    // Ends once every sender is gone and the queue is drained.
    for job in receiver.iter() {
        match catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => {
                if track {
                    counters.executed.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(payload) => {
                if track {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                }
                tracing::error!(panic = %panic_message(&*payload), "job panicked on worker");
            }
        }
    }
}
