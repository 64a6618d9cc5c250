//! Single-shot result callbacks

use crate::{TaskError, TaskResult};

type Deliver<T> = Box<dyn FnOnce(TaskResult<T>) + Send + 'static>;

/// Callback that is invoked exactly once
///
/// If the completion is dropped without [`Completion::complete`] being
/// called (the job was rejected, discarded, or unwound) the callback still
/// runs, with `TaskError::Dropped`.
pub struct Completion<T> {
    deliver: Option<Deliver<T>>,
}

impl<T> Completion<T> {
    /// Wrap `callback`
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(TaskResult<T>) + Send + 'static,
    {
        Self {
            deliver: Some(Box::new(callback)),
        }
    }

    /// Deliver the result
    pub fn complete(mut self, result: TaskResult<T>) {
        if let Some(deliver) = self.deliver.take() {
            deliver(result);
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(deliver) = self.deliver.take() {
            tracing::debug!("completion dropped without a result");
            deliver(Err(TaskError::Dropped));
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.deliver.is_some())
            .finish()
    }
}
