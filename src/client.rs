use crate::{
    config::{ClientConfig, ConfigError},
    database::DatabaseHandle,
    store::Store,
    util::pool::IoPool,
};

/// Entry point: a store plus the worker pool its calls run on.
///
/// Every handle obtained through a client shares its pool, so
/// [`ClientConfig::io_workers`] bounds the number of concurrent store calls
/// across all of them.
#[derive(Clone)]
pub struct Client<S: Store> {
    store: S,
    pool: IoPool,
}

impl<S: Store> Client<S> {
    pub fn new(store: S) -> Self {
        Client::with_config(store, &ClientConfig::default())
    }

    pub fn with_config(store: S, config: &ClientConfig) -> Self {
        tracing::debug!(io_workers = config.io_workers, "creating client");

        Client {
            store,
            pool: IoPool::new(config.io_workers),
        }
    }

    /// Configure from the environment, see [`ClientConfig::from_env`].
    pub fn from_env(store: S) -> Result<Self, ConfigError> {
        Ok(Client::with_config(store, &ClientConfig::from_env()?))
    }

    /// A handle on the database with this name. No I/O.
    pub fn database(&self, name: impl Into<String>) -> DatabaseHandle<S> {
        DatabaseHandle::new(self.store.clone(), self.pool.clone(), name)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pool(&self) -> &IoPool {
        &self.pool
    }

    /// Stop accepting store calls; see [`IoPool::close`].
    pub fn close(&self) {
        self.pool.close();
    }
}

impl<S: Store> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("pool", &self.pool).finish_non_exhaustive()
    }
}
