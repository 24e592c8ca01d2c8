use std::fmt::Display;

use crate::{
    address::{DocumentId, Namespace},
    document::DocumentHandle,
    store::Store,
    task::Task,
    update::IndexKeys,
    util::pool::IoPool,
};

/// A named collection. Hands out [`DocumentHandle`]s and declares indexes.
///
/// Holds no mutable state; clone and share it freely.
#[derive(Clone)]
pub struct CollectionHandle<S: Store> {
    store: S,
    pool: IoPool,
    namespace: Namespace,
}

impl<S: Store> CollectionHandle<S> {
    /// Typically it's better to use `database.collection(name)`.
    pub fn new(store: S, pool: IoPool, namespace: Namespace) -> Self {
        CollectionHandle {
            store,
            pool,
            namespace,
        }
    }

    /// A handle on the document with this id. No I/O.
    pub fn document(&self, id: impl Display) -> DocumentHandle<S> {
        DocumentHandle::new(
            self.store.clone(),
            self.pool.clone(),
            self.namespace.clone(),
            DocumentId::new(id),
        )
    }

    /// Declare an index with the given keys, resolving to its name.
    pub fn create_index(&self, keys: IndexKeys) -> Task<String, S::Error> {
        let store = self.store.clone();
        let namespace = self.namespace.clone();

        self.pool.run("create_index", &self.namespace, move || {
            store.create_index(&namespace, &keys)
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.namespace.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: Store> std::fmt::Debug for CollectionHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CollectionHandle").field(&self.namespace).finish()
    }
}
