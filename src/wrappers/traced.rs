use std::time::Instant;

use crate::{
    address::Namespace,
    store::{Document, Store},
    update::{Filter, FindOneAndUpdateOptions, IndexKeys, Update, UpdateOutcome},
};

/// Wrap this over a store to log every call with its duration.
///
/// Each call runs inside an `info` span named `store` carrying the operation
/// and the namespace. Filters and update documents are logged at `trace`,
/// since they hold user data.
///
#[cfg_attr(not(feature = "memory"), doc = "```ignore")]
#[cfg_attr(feature = "memory", doc = "```")]
/// use anydoc::{store::StoreEx, stores::memory::MemoryStore, wrappers::traced::TracedStore};
///
/// # tokio_test::block_on(async {
/// let store = TracedStore::new(MemoryStore::new());
/// let doc = store.client().database("game").collection("players").document("p1");
///
/// doc.increment("level", 1).await?;
///
/// assert_eq!(doc.fetch().await?.get("level"), Some(&1.into()));
/// # Ok::<_, anyhow::Error>(())
/// # }).unwrap()
/// ```
#[derive(Debug, Clone)]
pub struct TracedStore<S: Store> {
    underlying: S,
}

impl<S: Store> TracedStore<S> {
    pub fn new(underlying: S) -> Self {
        TracedStore { underlying }
    }

    pub fn inner(&self) -> &S {
        &self.underlying
    }

    pub fn destruct(self) -> S {
        self.underlying
    }

    fn traced<T>(
        &self,
        op: &'static str,
        namespace: &Namespace,
        call: impl FnOnce(&S) -> Result<T, S::Error>,
    ) -> Result<T, S::Error> {
        let span = tracing::info_span!("store", op, namespace = %namespace);
        let _entered = span.enter();

        let started = Instant::now();
        let result = call(&self.underlying);
        let elapsed_us = started.elapsed().as_micros() as u64;

        match &result {
            Ok(_) => tracing::info!(elapsed_us, "ok"),
            Err(e) => tracing::error!(elapsed_us, error = %e, "failed"),
        }

        result
    }
}

impl<S: Store> Store for TracedStore<S> {
    type Error = S::Error;

    fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        options: &FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, Self::Error> {
        self.traced("find_one_and_update", namespace, |store| {
            tracing::trace!(filter = ?filter, update = ?update, upsert = options.upsert);

            let found = store.find_one_and_update(namespace, filter, update, options)?;
            tracing::debug!(found = found.is_some());

            Ok(found)
        })
    }

    fn update_one(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, Self::Error> {
        self.traced("update_one", namespace, |store| {
            tracing::trace!(filter = ?filter, update = ?update, upsert);

            let outcome = store.update_one(namespace, filter, update, upsert)?;
            tracing::debug!(
                matched = outcome.matched_count,
                modified = outcome.modified_count,
                upserted = outcome.upserted()
            );

            Ok(outcome)
        })
    }

    fn create_index(&self, namespace: &Namespace, keys: &IndexKeys) -> Result<String, Self::Error> {
        self.traced("create_index", namespace, |store| {
            let name = store.create_index(namespace, keys)?;
            tracing::debug!(name = %name);

            Ok(name)
        })
    }
}

#[cfg(all(test, feature = "memory"))]
mod test {
    use crate::{stores::memory::MemoryStore, update::Filter};

    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("anydoc=trace")
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn passes_calls_through() {
        init_tracing();

        let store = TracedStore::new(MemoryStore::new());
        let ns = Namespace::new("testdb", "testcoll");
        let filter = Filter::eq("_id", "a");

        let outcome = store.update_one(&ns, &filter, &Update::set("n", 1), true).unwrap();
        assert!(outcome.upserted());

        let name = store.create_index(&ns, &IndexKeys::ascending("n")).unwrap();
        assert_eq!(name, "n_1");

        let found = store.inner().find_one(&ns, &filter).unwrap().unwrap();
        assert_eq!(found["n"], 1);
    }

    #[test]
    fn passes_errors_through() {
        init_tracing();

        let store = TracedStore::new(MemoryStore::new());
        let ns = Namespace::new("testdb", "testcoll");

        let err = store
            .update_one(&ns, &Filter::all(), &Update::new(), true)
            .unwrap_err();

        assert_eq!(err, crate::stores::memory::MemoryStoreError::EmptyUpdate);
    }
}
