use serde_json::{Map, Value};

use crate::{
    address::Namespace,
    client::Client,
    error::Error,
    update::{Filter, FindOneAndUpdateOptions, IndexKeys, Update, UpdateOutcome},
};

/// A document as the stores see it.
pub type Document = Map<String, Value>;

/// Main store driver.
///
/// This is what you need to implement to put the handles on top of another
/// document store. Calls are blocking; the handles never call them on the
/// caller's thread, only on the worker pool (see [`Task`](crate::task::Task)).
///
/// Every call is a single round trip and must be atomic for the one document
/// it touches. Databases and collections are expected to come into existence
/// on first write, so nothing here creates them explicitly.
pub trait Store: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Atomically find the first document matching `filter`, apply
    /// `update` (inserting if `options.upsert` and nothing matched) and
    /// return it, projected by `options.projection`.
    ///
    /// `None` only when nothing matched and no upsert happened.
    fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        options: &FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, Self::Error>;

    /// Atomically update the first document matching `filter`.
    fn update_one(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, Self::Error>;

    /// Declare an index, returning its name.
    fn create_index(&self, namespace: &Namespace, keys: &IndexKeys) -> Result<String, Self::Error>;
}

pub trait StoreEx: Store {
    /// Wrap the store into a [`Client`] with the default configuration.
    fn client(&self) -> Client<Self> {
        Client::new(self.clone())
    }
}

impl<S: Store> StoreEx for S {}

pub type StoreResult<V, S> = Result<V, Error<<S as Store>::Error>>;
