use crate::{address::Namespace, collection::CollectionHandle, store::Store, util::pool::IoPool};

/// A named database. Hands out [`CollectionHandle`]s.
///
/// Getting a handle doesn't create anything: stores materialize databases
/// and collections on first write.
#[derive(Clone)]
pub struct DatabaseHandle<S: Store> {
    store: S,
    pool: IoPool,
    name: String,
}

impl<S: Store> DatabaseHandle<S> {
    pub fn new(store: S, pool: IoPool, name: impl Into<String>) -> Self {
        DatabaseHandle {
            store,
            pool,
            name: name.into(),
        }
    }

    /// A handle on the collection with this name. No I/O.
    pub fn collection(&self, name: impl Into<String>) -> CollectionHandle<S> {
        CollectionHandle::new(
            self.store.clone(),
            self.pool.clone(),
            Namespace::new(self.name.clone(), name),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: Store> std::fmt::Debug for DatabaseHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DatabaseHandle").field(&self.name).finish()
    }
}
