use anydoc::{
    address::Namespace,
    config::ClientConfig,
    store::{Document, Store, StoreEx},
    stores::memory::{MemoryStore, ID_INDEX},
    update::{Filter, FindOneAndUpdateOptions, IndexKeys, Update, UpdateOutcome},
    wrappers::traced::TracedStore,
    Client, Error,
};
use serde_json::json;

mod common;

use common::{collection, init_tracing};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("connection refused")]
struct Refused;

/// A store whose server is never there.
#[derive(Debug, Clone)]
struct FailingStore;

impl Store for FailingStore {
    type Error = Refused;

    fn find_one_and_update(
        &self,
        _namespace: &Namespace,
        _filter: &Filter,
        _update: &Update,
        _options: &FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, Self::Error> {
        Err(Refused)
    }

    fn update_one(
        &self,
        _namespace: &Namespace,
        _filter: &Filter,
        _update: &Update,
        _upsert: bool,
    ) -> Result<UpdateOutcome, Self::Error> {
        Err(Refused)
    }

    fn create_index(&self, _namespace: &Namespace, _keys: &IndexKeys) -> Result<String, Self::Error> {
        Err(Refused)
    }
}

#[test]
fn handles_do_no_io() {
    let store = MemoryStore::new();
    let coll = collection(&store);

    let doc = coll.document(42);
    assert_eq!(doc.id().as_str(), "42");
    assert_eq!(doc.namespace(), &Namespace::new("testdb", "testcoll"));
    assert_eq!(coll.name(), "testcoll");

    assert!(store.database_names().is_empty());
    assert!(store.collection_names("testdb").is_empty());
}

#[tokio::test]
async fn databases_materialize_on_first_write() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let coll = collection(&store);

    coll.document("a").fetch().await?;

    assert_eq!(store.database_names(), vec!["testdb".to_owned()]);
    assert_eq!(store.collection_names("testdb"), vec!["testcoll".to_owned()]);

    Ok(())
}

#[tokio::test]
async fn create_index() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let coll = collection(&store);

    let name = coll
        .create_index(IndexKeys::descending("score").then_ascending("name"))
        .await?;
    assert_eq!(name, "score_-1_name_1");

    // declaring it again is fine
    coll.create_index(IndexKeys::descending("score").then_ascending("name"))
        .await?;

    assert_eq!(store.list_indexes(coll.namespace()), vec![ID_INDEX.to_owned(), name]);

    Ok(())
}

#[tokio::test]
async fn store_errors_surface_unchanged() {
    init_tracing();

    let doc = FailingStore.client().database("testdb").collection("testcoll").document("a");

    let err = doc.fetch().await.unwrap_err();
    assert_eq!(err.to_string(), "connection refused");
    assert_eq!(err.into_store_error(), Some(Refused));

    assert!(matches!(doc.increment("n", 1).await, Err(Error::Store(Refused))));
    assert!(doc.cached().is_none());

    let coll = FailingStore.client().database("testdb").collection("testcoll");
    assert!(matches!(
        coll.create_index(IndexKeys::ascending("n")).await,
        Err(Error::Store(Refused))
    ));
}

#[tokio::test]
async fn closed_clients_refuse_work() {
    let client = MemoryStore::new().client();
    let doc = client.database("testdb").collection("testcoll").document("a");

    client.close();

    assert!(matches!(doc.fetch().await, Err(Error::PoolClosed)));
}

#[tokio::test]
async fn configured_pool_size() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let client = Client::with_config(store.clone(), &ClientConfig::default().with_io_workers(3));

    assert_eq!(client.pool().size(), 3);

    let doc = client.database("testdb").collection("testcoll").document("a");
    doc.assign("n", 1).await?;
    assert_eq!(client.pool().available(), 3);

    Ok(())
}

#[tokio::test]
async fn traced_store_behaves_like_its_inner_store() -> anyhow::Result<()> {
    init_tracing();

    let store = MemoryStore::new();
    let doc = TracedStore::new(store.clone())
        .client()
        .database("testdb")
        .collection("testcoll")
        .document("a");

    doc.assign("balance", 5).await?;
    assert!(!doc.conditional_decrement("balance", 6).await?.applied());
    assert!(doc.conditional_decrement("balance", 5).await?.applied());

    let found = store.find_one(doc.namespace(), &doc.identity_filter())?;
    assert_eq!(found.map(serde_json::Value::Object), Some(json!({"_id": "a", "balance": 0})));

    Ok(())
}
