use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::{
    address::{DocumentId, FieldPath, Namespace, ID_FIELD},
    error::Error,
    store::Store,
    task::Task,
    update::{Amount, Filter, FindOneAndUpdateOptions, Projection, Update, UpdateOp, UpdateOutcome},
    util::pool::IoPool,
};

use super::Snapshot;

/// A handle on one document of a collection.
///
/// The handle caches the last document it fetched and turns the
/// high-level mutations into single atomic updates executed by the store.
/// Creating a handle doesn't touch the store; the document may or may not
/// exist until the first fetch or upserting mutation.
///
/// Every store-touching method returns a cold [`Task`]: nothing happens
/// until it's awaited.
///
/// The cache is never updated by mutations, only by [`fetch`](Self::fetch).
/// It doesn't follow changes made by anyone else either, so a cached
/// snapshot may be stale.
///
/// Clones share the cache. Concurrent fetches through the same handle
/// (or its clones) are safe: each replaces the cached snapshot as a whole,
/// and the last one to complete wins.
#[derive(Clone)]
pub struct DocumentHandle<S: Store> {
    store: S,
    pool: IoPool,
    namespace: Namespace,
    id: DocumentId,
    cache: Arc<RwLock<Option<Snapshot>>>,
}

impl<S: Store> DocumentHandle<S> {
    /// Typically it's better to use `collection.document(id)`.
    pub fn new(store: S, pool: IoPool, namespace: Namespace, id: DocumentId) -> Self {
        DocumentHandle {
            store,
            pool,
            namespace,
            id,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// The collection this document lives in.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `{"_id": "<id>"}`: the filter that selects this document.
    ///
    /// Conjoin it with your own predicates when using [`update_where`](Self::update_where).
    pub fn identity_filter(&self) -> Filter {
        Filter::eq(ID_FIELD, self.id.as_str())
    }

    /// The cached snapshot, without any I/O.
    pub fn cached(&self) -> Option<Snapshot> {
        self.cache.read().clone()
    }

    /// Fetch the latest version of the document and cache it.
    ///
    /// The document is created (with only its id) if it doesn't exist yet,
    /// atomically with the read, so this never fails with "not found".
    pub fn fetch(&self) -> Task<Snapshot, S::Error> {
        let cache = self.cache.clone();
        let call = self.find_and_upsert("fetch", None);

        Task::new("fetch", async move {
            let snapshot = call.await?;
            *cache.write() = Some(snapshot.clone());

            Ok(snapshot)
        })
    }

    /// Like [`fetch`](Self::fetch), but only returns the fields selected by
    /// `projection`.
    ///
    /// The projected document is not cached: the cache only ever holds
    /// complete documents.
    pub fn fetch_projected(&self, projection: Projection) -> Task<Snapshot, S::Error> {
        self.find_and_upsert("fetch_projected", Some(projection))
    }

    /// The cached snapshot if there is one, otherwise [`fetch`](Self::fetch).
    ///
    /// The cache is checked when the task runs, not when it's created.
    pub fn cached_or_fetch(&self) -> Task<Snapshot, S::Error> {
        let cache = self.cache.clone();
        let fetch = self.fetch();

        Task::new("cached_or_fetch", async move {
            let cached = cache.read().clone();

            match cached {
                Some(snapshot) => Ok(snapshot),
                None => fetch.await,
            }
        })
    }

    fn find_and_upsert(
        &self,
        op: &'static str,
        projection: Option<Projection>,
    ) -> Task<Snapshot, S::Error> {
        let store = self.store.clone();
        let namespace = self.namespace.clone();
        let filter = self.identity_filter();
        let update = Update::set_on_insert(ID_FIELD, self.id.as_str());
        let options = FindOneAndUpdateOptions::default()
            .upsert(true)
            .projection(projection);

        let call = self.pool.run(op, &self.namespace, move || {
            store.find_one_and_update(&namespace, &filter, &update, &options)
        });

        Task::new(op, async move {
            call.await?
                .map(Snapshot::new)
                .ok_or(Error::NothingUpserted)
        })
    }

    /// Set `path` to `value`. Creates the document if it doesn't exist.
    ///
    /// Dotted paths create the embedded documents they go through.
    pub fn assign(
        &self,
        path: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::Assign(path.into(), value.into()))
    }

    /// Add `amount` (negative to subtract) to `path`. A missing field
    /// is created with `amount` as its value; a missing document is created.
    pub fn increment(
        &self,
        path: impl Into<FieldPath>,
        amount: impl Into<Amount>,
    ) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::Increment(path.into(), amount.into()))
    }

    /// Subtract `amount` from `path` if, and only if, it currently holds at
    /// least `|amount|`.
    ///
    /// The check and the write happen atomically in the store, so two
    /// concurrent decrements can never overdraw the field. Check
    /// [`UpdateOutcome::applied`] to see whether it went through: an
    /// insufficient balance is a successful outcome with nothing modified,
    /// not an error.
    ///
    /// A negative `amount` adds `|amount|`, but still only when the field
    /// holds at least `|amount|`. Never creates the document.
    pub fn conditional_decrement(
        &self,
        path: impl Into<FieldPath>,
        amount: impl Into<Amount>,
    ) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::ConditionalDecrement(path.into(), amount.into()))
    }

    /// Append `value` to the array at `path`, creating the array and the
    /// document if needed. An array `value` is appended as a single nested
    /// element.
    pub fn append(
        &self,
        path: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::Append(path.into(), value.into()))
    }

    /// Remove the first element of the array at `path`.
    ///
    /// Popping the only element leaves an empty array. Never creates the
    /// document.
    pub fn pop_first(&self, path: impl Into<FieldPath>) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::PopFirst(path.into()))
    }

    /// Remove the last element of the array at `path`.
    pub fn pop_last(&self, path: impl Into<FieldPath>) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::PopLast(path.into()))
    }

    /// Remove the field at `path`. Nothing is modified if it's already
    /// absent. Never creates the document.
    pub fn unset(&self, path: impl Into<FieldPath>) -> Task<UpdateOutcome, S::Error> {
        self.apply(UpdateOp::Unset(path.into()))
    }

    /// Run any [`UpdateOp`] against this document.
    pub fn apply(&self, op: UpdateOp) -> Task<UpdateOutcome, S::Error> {
        let native = op.translate(self.identity_filter());

        self.run_update(op.kind(), native.filter, native.update, native.upsert)
    }

    /// Send a native update to this document.
    pub fn update(&self, update: Update, upsert: bool) -> Task<UpdateOutcome, S::Error> {
        self.run_update("update", self.identity_filter(), update, upsert)
    }

    /// Send a native update with your own filter.
    ///
    /// The filter is used as is: add [`identity_filter`](Self::identity_filter)
    /// yourself if it should only ever touch this document.
    pub fn update_where(
        &self,
        filter: Filter,
        update: Update,
        upsert: bool,
    ) -> Task<UpdateOutcome, S::Error> {
        self.run_update("update_where", filter, update, upsert)
    }

    fn run_update(
        &self,
        op: &'static str,
        filter: Filter,
        update: Update,
        upsert: bool,
    ) -> Task<UpdateOutcome, S::Error> {
        let store = self.store.clone();
        let namespace = self.namespace.clone();

        self.pool.run(op, &self.namespace, move || {
            store.update_one(&namespace, &filter, &update, upsert)
        })
    }
}

impl<S: Store> std::fmt::Debug for DocumentHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("namespace", &self.namespace)
            .field("id", &self.id)
            .field("cached", &self.cache.read().is_some())
            .finish()
    }
}
