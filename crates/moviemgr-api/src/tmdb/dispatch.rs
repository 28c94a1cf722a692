//! Callback-style delivery of operation results.
//!
//! Operations run as tokio tasks on any worker; their completions are
//! queued and run only where a `CompletionLoop` drains them, so callers can
//! confine result handling to a single context.

use std::fmt;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::TmdbError;

/// A queued completion, ready to run.
type Completion = Box<dyn FnOnce() + Send>;

/// Converts an operation result into a `(value, error)` pair.
pub trait IntoCompletion<T> {
    /// Returns `(value, None)` on success and `(T::default(), Some(error))`
    /// on failure.
    fn into_completion(self) -> (T, Option<TmdbError>);
}

impl<T: Default> IntoCompletion<T> for Result<T, TmdbError> {
    fn into_completion(self) -> (T, Option<TmdbError>) {
        match self {
            Ok(value) => (value, None),
            Err(e) => (T::default(), Some(e)),
        }
    }
}

/// Creates a connected queue and loop.
#[must_use]
pub fn completion_queue() -> (CompletionQueue, CompletionLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (CompletionQueue { sender }, CompletionLoop { receiver })
}

/// Spawns operations and forwards their completions to a `CompletionLoop`.
#[derive(Debug, Clone)]
pub struct CompletionQueue {
    /// Completion channel.
    sender: mpsc::UnboundedSender<Completion>,
}

impl CompletionQueue {
    /// Spawns `operation` and queues `completion` with its output.
    ///
    /// Dropping the returned handle detaches the task; the completion is
    /// still delivered. Aborting it cancels the task and the completion
    /// never runs. Must be called within a tokio runtime.
    pub fn dispatch<F, T, C>(&self, operation: F, completion: C) -> JoinHandle<()>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let output = operation.await;
            if sender.send(Box::new(move || completion(output))).is_err() {
                tracing::debug!("Completion loop closed, dropping result");
            }
        })
    }

    /// Like [`dispatch`](Self::dispatch), delivering a fallible result as
    /// `(value, error)`.
    pub fn dispatch_result<F, T, C>(&self, operation: F, completion: C) -> JoinHandle<()>
    where
        F: Future<Output = Result<T, TmdbError>> + Send + 'static,
        T: Default + Send + 'static,
        C: FnOnce(T, Option<TmdbError>) + Send + 'static,
    {
        self.dispatch(operation, move |result| {
            let (value, error) = result.into_completion();
            completion(value, error);
        })
    }
}

/// Runs queued completions in the caller's context.
pub struct CompletionLoop {
    /// Completion channel.
    receiver: mpsc::UnboundedReceiver<Completion>,
}

impl CompletionLoop {
    /// Waits for the next completion and runs it.
    ///
    /// Returns `false` once every queue handle and in-flight task is gone
    /// and nothing is left to run.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(completion) => {
                completion();
                true
            }
            None => false,
        }
    }

    /// Runs every completion already delivered, without waiting.
    ///
    /// Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            completion();
            ran += 1;
        }
        ran
    }

    /// Runs completions until every queue handle and in-flight task is gone.
    pub async fn run(mut self) {
        while self.run_next().await {}
    }
}

impl fmt::Debug for CompletionLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionLoop").finish_non_exhaustive()
    }
}
