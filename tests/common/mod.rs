#![allow(dead_code)]

use anydoc::{
    collection::CollectionHandle, store::StoreEx, stores::memory::MemoryStore, DocumentHandle,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("anydoc=debug")
        .with_test_writer()
        .try_init();
}

pub fn collection(store: &MemoryStore) -> CollectionHandle<MemoryStore> {
    init_tracing();

    store.client().database("testdb").collection("testcoll")
}

/// A handle on a document nobody has used yet.
pub fn fresh_document(store: &MemoryStore) -> DocumentHandle<MemoryStore> {
    collection(store).document(uuid::Uuid::new_v4())
}
