//! # Worker pool for blocking work
//!
//! CPU-bound jobs run on a fixed set of OS threads fed by a bounded queue.
//! Callers only block while enqueueing; results come back either as a
//! [`TaskHandle`] future or through a [`Completion`] callback that fires
//! exactly once.

pub mod completion;
pub mod executor;
pub mod task;

pub use completion::Completion;
pub use executor::{ExecutorConfig, ExecutorMetrics, WorkerPool};
pub use task::{TaskError, TaskHandle, TaskResult};

/// Re-export common types
pub type Result<T> = std::result::Result<T, TaskError>;
