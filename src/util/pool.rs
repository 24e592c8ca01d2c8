use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::{address::Namespace, error::Error, task::Task};

/// Bounded pool for blocking store calls.
///
/// Calls run on tokio's blocking threads, at most `size` at a time. The
/// permit travels with the blocking closure, so a call keeps its slot until
/// the store returns even if nobody awaits the result anymore.
#[derive(Debug, Clone)]
pub struct IoPool {
    size: usize,
    permits: Arc<Semaphore>,
}

impl IoPool {
    pub fn new(size: usize) -> IoPool {
        let size = size.max(1);

        IoPool {
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not taken by running calls.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuse new calls. Calls already running finish normally; tasks that
    /// haven't got a slot yet fail with [`Error::PoolClosed`].
    pub fn close(&self) {
        self.permits.close();
    }

    /// Wrap a blocking store call into a cold [`Task`].
    pub fn run<T, E, F>(&self, op: &'static str, namespace: &Namespace, call: F) -> Task<T, E>
    where
        T: Send + 'static,
        E: std::error::Error + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let permits = self.permits.clone();
        let span = tracing::debug_span!("store_call", op, namespace = %namespace);

        Task::new(
            op,
            async move {
                let permit = permits.acquire_owned().await.map_err(|_| Error::PoolClosed)?;

                tracing::debug!("started");

                let result = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    call()
                })
                .await;

                match result {
                    Ok(Ok(value)) => {
                        tracing::debug!("done");
                        Ok(value)
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "store call failed");
                        Err(Error::Store(e))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "worker failed");
                        Err(Error::Worker(e))
                    }
                }
            }
            .instrument(span),
        )
    }
}

impl Default for IoPool {
    fn default() -> Self {
        IoPool::new(crate::config::DEFAULT_IO_WORKERS)
    }
}
