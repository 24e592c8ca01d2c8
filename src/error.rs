use thiserror::Error;
use tokio::task::JoinError;

/// Failure of a [`Task`](crate::task::Task).
///
/// `E` is the error type of the underlying [`Store`](crate::store::Store).
/// A store error is passed through unchanged: the handles never retry and
/// never try to recover, so when a task fails the state of the document is
/// unknown until it's fetched again.
///
/// Note that a guarded update whose guard didn't hold is *not* an error.
/// It resolves successfully with `modified_count == 0`.
#[derive(Debug, Error)]
pub enum Error<E: std::error::Error + 'static> {
    /// Transport or driver failure reported by the store.
    #[error(transparent)]
    Store(E),

    /// The blocking worker panicked or was torn down with the runtime.
    #[error("worker failed: {0}")]
    Worker(#[from] JoinError),

    #[error("worker pool is closed")]
    PoolClosed,

    /// An upserting find-and-modify came back empty, which a store must
    /// never do.
    #[error("store returned no document from an upserting fetch")]
    NothingUpserted,
}

impl<E: std::error::Error + 'static> Error<E> {
    /// The store error, if that's what this is.
    pub fn store_error(&self) -> Option<&E> {
        match self {
            Error::Store(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_store_error(self) -> Option<E> {
        match self {
            Error::Store(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Error, PartialEq, Eq)]
    #[error("connection refused")]
    struct Refused;

    #[test]
    fn store_errors_are_transparent() {
        let err: Error<Refused> = Error::Store(Refused);

        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.store_error(), Some(&Refused));
        assert_eq!(err.into_store_error(), Some(Refused));
    }

    #[test]
    fn pool_closed_is_not_a_store_error() {
        let err: Error<Refused> = Error::PoolClosed;

        assert_eq!(err.to_string(), "worker pool is closed");
        assert!(err.store_error().is_none());
    }
}
