//! Task errors and the future side of a submitted task

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// Error types for worker pool operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task panicked while running
    #[error("Task panicked: {0}")]
    Panicked(String),
    /// The pool no longer accepts work
    #[error("Worker pool is shut down")]
    ShutDown,
    /// The bounded queue had no room and the caller asked not to wait
    #[error("Worker queue is full")]
    QueueFull,
    /// The task was discarded without running
    #[error("Task was dropped before completing")]
    Dropped,
    /// The caller stopped waiting
    #[error("Timeout error")]
    Timeout,
    /// A worker thread could not be started
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// Result type for pool tasks
pub type TaskResult<T> = Result<T, TaskError>;

/// Pending result of a task submitted to a [`crate::WorkerPool`]
///
/// Dropping the handle does not cancel the task; its result is discarded.
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<TaskResult<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<TaskResult<T>>) -> Self {
        Self { receiver }
    }

    /// A handle that resolves immediately with `result`
    #[must_use]
    pub fn ready(result: TaskResult<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { receiver: rx }
    }

    /// Wait at most `duration`, then abandon the task
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Timeout` if the task has not finished in time, or
    /// the task's own error.
    pub async fn with_timeout(self, duration: Duration) -> TaskResult<T> {
        match tokio::time::timeout(duration, self).await {
            Ok(result) => result,
            Err(_) => Err(TaskError::Timeout),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = TaskResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(TaskError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
