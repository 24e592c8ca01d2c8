use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{future::BoxFuture, FutureExt};
use tokio::task::JoinHandle;

use crate::error::Error;

/// A deferred, single-result unit of work.
///
/// Tasks are cold: building one does nothing, the work starts when it's
/// first polled (`.await`ed or [`spawn`](Task::spawn)ed). Calling the same
/// handle method twice gives two tasks and, once both are awaited, two
/// independent round trips.
///
/// A task resolves exactly once, to a value or to an error. There's no
/// cancellation: dropping a task that already started doesn't stop the store
/// call running on the worker pool, and there's no built-in timeout either.
/// Wrap it (e.g. in `tokio::time::timeout`) if you need one.
#[must_use = "tasks do nothing unless awaited or spawned"]
pub struct Task<T, E: std::error::Error + 'static> {
    op: &'static str,
    inner: BoxFuture<'static, Result<T, Error<E>>>,
}

impl<T, E: std::error::Error + 'static> Task<T, E> {
    pub fn new<F>(op: &'static str, fut: F) -> Self
    where
        F: Future<Output = Result<T, Error<E>>> + Send + 'static,
    {
        Task {
            op,
            inner: fut.boxed(),
        }
    }

    /// A task that resolves to `value` without touching any store.
    pub fn ready(op: &'static str, value: T) -> Self
    where
        T: Send + 'static,
    {
        Task::new(op, async move { Ok(value) })
    }

    /// Name of the operation, as it appears in the logs.
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// Transform the result once the task completes. Still cold.
    pub fn map<U, F>(self, f: F) -> Task<U, E>
    where
        T: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let Task { op, inner } = self;

        Task::new(op, async move { inner.await.map(f) })
    }

    /// Start the task right away on the current tokio runtime.
    ///
    /// Panics when called outside of a runtime.
    pub fn spawn(self) -> JoinHandle<Result<T, Error<E>>>
    where
        T: Send + 'static,
        E: Send,
    {
        tokio::spawn(self.inner)
    }
}

impl<T, E: std::error::Error + 'static> Future for Task<T, E> {
    type Output = Result<T, Error<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

impl<T, E: std::error::Error + 'static> std::fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("op", &self.op).finish_non_exhaustive()
    }
}
