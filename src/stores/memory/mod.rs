//! An in-process [`Store`] with the single-document semantics of a
//! MongoDB-like server.
//!
//! Useful for tests and prototyping. Every call takes one write lock, so
//! each update is atomic with respect to all others.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    address::{DocumentId, FieldPath, FieldPathError, Namespace, ID_FIELD},
    store::{Document, Store},
    update::{Filter, FindOneAndUpdateOptions, IndexKeys, ReturnDocument, Update, UpdateOutcome},
};

mod apply;
mod matcher;
mod projection;
pub(crate) mod traverse;

/// Name of the index every collection has on `_id`.
pub const ID_INDEX: &str = "_id_";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MemoryStoreError {
    #[error(transparent)]
    InvalidPath(#[from] FieldPathError),

    #[error("cannot create field at {path}: found {found} in the way")]
    PathConflict { path: String, found: String },

    #[error("{op} on {path}: expected {expected}, found {found}")]
    TypeMismatch {
        op: String,
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{op} on {path}: invalid operand {operand}")]
    InvalidOperand { op: String, path: String, operand: Value },

    #[error("unknown operator {0}")]
    UnknownOperator(String),

    #[error("cannot write {path}: index {index} is too far past the end of the array")]
    IndexTooLarge { path: String, index: usize },

    #[error("update document is empty")]
    EmptyUpdate,

    #[error("update touches {0} more than once")]
    ConflictingPaths(String),

    #[error("_id cannot be modified")]
    ImmutableId,

    #[error("{op} on {path} overflows")]
    Overflow { op: String, path: String },

    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    #[error("index needs at least one key")]
    EmptyIndex,

    #[error("duplicate key: _id {0}")]
    DuplicateKey(DocumentId),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

#[derive(Debug, Default)]
struct Collection {
    documents: Vec<Value>,
    indexes: BTreeMap<String, IndexKeys>,
}

impl Collection {
    fn position(&self, filter: &Filter) -> Result<Option<usize>, MemoryStoreError> {
        for (ix, doc) in self.documents.iter().enumerate() {
            if matcher::matches(doc, filter.as_map())? {
                return Ok(Some(ix));
            }
        }

        Ok(None)
    }

    /// Whether a document with this exact `_id` value is stored.
    fn contains_id(&self, id: &Value) -> bool {
        self.documents
            .iter()
            .any(|doc| doc.get(ID_FIELD).is_some_and(|other| matcher::values_equal(other, id)))
    }
}

type Databases = BTreeMap<String, BTreeMap<String, Collection>>;

/// Documents kept in memory, grouped by database and collection.
///
/// Clones share the same data. Databases and collections come into
/// existence on the first write into them.
///
/// ```
/// # use anydoc::{stores::memory::MemoryStore, store::StoreEx};
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let doc = store.client().database("game").collection("players").document("p1");
///
/// doc.assign("name", "toon").await?;
///
/// assert!(store.find_one(doc.namespace(), &doc.identity_filter())?.is_some());
/// assert_eq!(store.database_names(), vec!["game".to_owned()]);
/// # Ok::<_, anyhow::Error>(())
/// # }).unwrap()
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    databases: Arc<RwLock<Databases>>,
}

/// What a single-document modification ended up doing.
enum Modification {
    Missed,
    Updated { before: Value, after: Value, changed: bool },
    Inserted { id: DocumentId, after: Value },
}

/// The `_id` of `doc`, as stored and as a [`DocumentId`]. A uuid is
/// generated for documents without one.
fn ensure_id(doc: &mut Value) -> Result<(Value, DocumentId), MemoryStoreError> {
    match doc.get(ID_FIELD) {
        Some(Value::String(s)) => Ok((Value::from(s.as_str()), DocumentId::new(s))),
        Some(other) => Ok((other.clone(), DocumentId::new(other))),
        None => {
            let id = DocumentId::new(uuid::Uuid::new_v4());
            let raw = Value::from(id.as_str());
            apply::assign(doc, &FieldPath::from(ID_FIELD), raw.clone())?;

            Ok((raw, id))
        }
    }
}

fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Field values a filter pins down with equality, to start an upserted
/// document from.
fn seed(doc: &mut Value, filter: &Map<String, Value>) -> Result<(), MemoryStoreError> {
    for (key, cond) in filter {
        if key == "$and" {
            for clause in cond.as_array().into_iter().flatten() {
                if let Value::Object(clause) = clause {
                    seed(doc, clause)?;
                }
            }
            continue;
        }

        if key.starts_with('$') {
            continue;
        }

        let value = match cond {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => match ops.get("$eq") {
                Some(v) => v,
                None => continue,
            },
            other => other,
        };

        apply::assign(doc, &FieldPath::from(key), value.clone())?;
    }

    Ok(())
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn modify(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<Modification, MemoryStoreError> {
        apply::validate(update)?;

        let mut databases = self.databases.write();

        let existing = databases
            .get_mut(&namespace.database)
            .and_then(|db| db.get_mut(&namespace.collection));

        if let Some(collection) = existing {
            if let Some(ix) = collection.position(filter)? {
                let before = collection.documents[ix].clone();
                let mut after = before.clone();
                apply::apply_update(&mut after, update, false)?;

                let changed = after != before;
                if changed {
                    collection.documents[ix] = after.clone();
                }

                return Ok(Modification::Updated {
                    before,
                    after,
                    changed,
                });
            }
        }

        if !upsert {
            return Ok(Modification::Missed);
        }

        let mut doc = Value::Object(Map::new());
        seed(&mut doc, filter.as_map())?;
        apply::apply_update(&mut doc, update, true)?;

        let (raw_id, id) = ensure_id(&mut doc)?;

        let collection = databases
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        if collection.contains_id(&raw_id) {
            return Err(MemoryStoreError::DuplicateKey(id));
        }

        tracing::trace!(namespace = %namespace, id = %id, "upserted");
        collection.documents.push(doc.clone());

        Ok(Modification::Inserted { id, after: doc })
    }

    /// Insert a complete document, generating an `_id` if it has none.
    pub fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> Result<DocumentId, MemoryStoreError> {
        let mut doc = Value::Object(document);

        let (raw_id, id) = ensure_id(&mut doc)?;

        let mut databases = self.databases.write();
        let collection = databases
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        if collection.contains_id(&raw_id) {
            return Err(MemoryStoreError::DuplicateKey(id));
        }
        collection.documents.push(doc);

        Ok(id)
    }

    /// The first document matching `filter`, without touching anything.
    pub fn find_one(
        &self,
        namespace: &Namespace,
        filter: &Filter,
    ) -> Result<Option<Document>, MemoryStoreError> {
        let databases = self.databases.read();

        let Some(collection) = databases
            .get(&namespace.database)
            .and_then(|db| db.get(&namespace.collection))
        else {
            return Ok(None);
        };

        Ok(collection
            .position(filter)?
            .map(|ix| into_document(collection.documents[ix].clone())))
    }

    pub fn count(&self, namespace: &Namespace, filter: &Filter) -> Result<usize, MemoryStoreError> {
        let databases = self.databases.read();

        let Some(collection) = databases
            .get(&namespace.database)
            .and_then(|db| db.get(&namespace.collection))
        else {
            return Ok(0);
        };

        let mut count = 0;
        for doc in &collection.documents {
            if matcher::matches(doc, filter.as_map())? {
                count += 1;
            }
        }

        Ok(count)
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.read().keys().cloned().collect()
    }

    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.databases
            .read()
            .get(database)
            .map(|db| db.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Index names of a collection, starting with [`ID_INDEX`]. Empty if the
    /// collection doesn't exist.
    pub fn list_indexes(&self, namespace: &Namespace) -> Vec<String> {
        let databases = self.databases.read();

        match databases
            .get(&namespace.database)
            .and_then(|db| db.get(&namespace.collection))
        {
            Some(collection) => std::iter::once(ID_INDEX.to_owned())
                .chain(collection.indexes.keys().cloned())
                .collect(),
            None => vec![],
        }
    }
}

impl Store for MemoryStore {
    type Error = MemoryStoreError;

    fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        options: &FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, Self::Error> {
        if let Some(p) = &options.projection {
            projection::validate(p)?;
        }

        let returned = match self.modify(namespace, filter, update, options.upsert)? {
            Modification::Missed => None,
            Modification::Updated { before, after, .. } => match options.return_document {
                ReturnDocument::Before => Some(before),
                ReturnDocument::After => Some(after),
            },
            Modification::Inserted { after, .. } => match options.return_document {
                ReturnDocument::Before => None,
                ReturnDocument::After => Some(after),
            },
        };

        returned
            .map(|doc| match &options.projection {
                Some(p) => projection::project(&doc, p),
                None => Ok(doc),
            })
            .transpose()
            .map(|doc| doc.map(into_document))
    }

    fn update_one(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, Self::Error> {
        Ok(match self.modify(namespace, filter, update, upsert)? {
            Modification::Missed => UpdateOutcome::default(),
            Modification::Updated { changed, .. } => UpdateOutcome {
                matched_count: 1,
                modified_count: changed as u64,
                upserted_id: None,
            },
            Modification::Inserted { id, .. } => UpdateOutcome {
                matched_count: 0,
                modified_count: 0,
                upserted_id: Some(id),
            },
        })
    }

    fn create_index(&self, namespace: &Namespace, keys: &IndexKeys) -> Result<String, Self::Error> {
        if keys.is_empty() {
            return Err(MemoryStoreError::EmptyIndex);
        }
        for (path, _) in keys.keys() {
            path.validate()?;
        }

        let name = keys.name();

        self.databases
            .write()
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default()
            .indexes
            .insert(name.clone(), keys.clone());

        Ok(name)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::update::Projection;

    use super::*;

    fn ns() -> Namespace {
        Namespace::new("testdb", "testcoll")
    }

    fn doc(v: Value) -> Document {
        into_document(v)
    }

    #[test]
    fn upsert_seeds_from_filter() {
        let store = MemoryStore::new();
        let filter = Filter::eq("_id", "a");

        let outcome = store.update_one(&ns(), &filter, &Update::set("n", 1), true).unwrap();
        assert_eq!(outcome.upserted_id, Some(DocumentId::new("a")));
        assert_eq!(outcome.modified_count, 0);

        let found = store.find_one(&ns(), &filter).unwrap().unwrap();
        assert_eq!(Value::Object(found), json!({"_id": "a", "n": 1}));
    }

    #[test]
    fn updates_existing() {
        let store = MemoryStore::new();
        store.insert_one(&ns(), doc(json!({"_id": "a", "n": 1}))).unwrap();

        let outcome = store
            .update_one(&ns(), &Filter::eq("_id", "a"), &Update::inc("n", 2), true)
            .unwrap();
        assert_eq!((outcome.matched_count, outcome.modified_count), (1, 1));

        let outcome = store
            .update_one(&ns(), &Filter::eq("_id", "a"), &Update::set("n", 3), false)
            .unwrap();
        assert_eq!((outcome.matched_count, outcome.modified_count), (1, 0));
    }

    #[test]
    fn guarded_update_misses_without_upsert() {
        let store = MemoryStore::new();
        store.insert_one(&ns(), doc(json!({"_id": "a", "n": 1}))).unwrap();

        let filter = Filter::eq("_id", "a").and(Filter::gte("n", 5));
        let outcome = store.update_one(&ns(), &filter, &Update::inc("n", -5), false).unwrap();

        assert_eq!(outcome, UpdateOutcome::default());
        assert_eq!(store.count(&ns(), &Filter::eq("n", 1)).unwrap(), 1);
    }

    #[test]
    fn failed_updates_leave_no_trace() {
        let store = MemoryStore::new();
        store.insert_one(&ns(), doc(json!({"_id": "a", "n": "x"}))).unwrap();

        let update = Update::set("m", 1).combine(Update::inc("n", 1));
        assert!(store.update_one(&ns(), &Filter::eq("_id", "a"), &update, false).is_err());

        let found = store.find_one(&ns(), &Filter::eq("_id", "a")).unwrap().unwrap();
        assert_eq!(Value::Object(found), json!({"_id": "a", "n": "x"}));
    }

    #[test]
    fn find_one_and_update_returns_requested_version() {
        let store = MemoryStore::new();
        store.insert_one(&ns(), doc(json!({"_id": "a", "n": 1}))).unwrap();
        let filter = Filter::eq("_id", "a");

        let options = FindOneAndUpdateOptions::default().return_document(ReturnDocument::Before);
        let before = store
            .find_one_and_update(&ns(), &filter, &Update::inc("n", 1), &options)
            .unwrap()
            .unwrap();
        assert_eq!(before["n"], json!(1));

        let options = FindOneAndUpdateOptions::default()
            .projection(Some(Projection::include(["n"])))
            .return_document(ReturnDocument::After);
        let after = store
            .find_one_and_update(&ns(), &filter, &Update::inc("n", 1), &options)
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(after), json!({"_id": "a", "n": 3}));

        let missed = store
            .find_one_and_update(&ns(), &Filter::eq("_id", "b"), &Update::inc("n", 1), &options)
            .unwrap();
        assert!(missed.is_none());
    }

    #[test]
    fn upsert_generates_ids() {
        let store = MemoryStore::new();

        let outcome = store
            .update_one(&ns(), &Filter::eq("kind", "x"), &Update::set("n", 1), true)
            .unwrap();

        let id = outcome.upserted_id.unwrap();
        let found = store.find_one(&ns(), &Filter::eq("_id", id.as_str())).unwrap().unwrap();
        assert_eq!(found["kind"], json!("x"));
    }

    #[test]
    fn duplicate_ids() {
        let store = MemoryStore::new();
        store.insert_one(&ns(), doc(json!({"_id": "a", "n": 1}))).unwrap();

        assert_eq!(
            store.insert_one(&ns(), doc(json!({"_id": "a"}))),
            Err(MemoryStoreError::DuplicateKey(DocumentId::new("a")))
        );

        let filter = Filter::eq("_id", "a").and(Filter::gte("n", 5));
        assert!(matches!(
            store.update_one(&ns(), &filter, &Update::set("m", 1), true),
            Err(MemoryStoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn ids_of_other_types_are_distinct() {
        let store = MemoryStore::new();
        store.insert_one(&ns(), doc(json!({"_id": 42, "n": 1}))).unwrap();

        let outcome = store
            .update_one(&ns(), &Filter::eq("_id", "42"), &Update::set("n", 2), true)
            .unwrap();
        assert_eq!(outcome.upserted_id, Some(DocumentId::new("42")));
        assert_eq!(store.count(&ns(), &Filter::all()).unwrap(), 2);

        assert_eq!(
            store.insert_one(&ns(), doc(json!({"_id": 42.0}))),
            Err(MemoryStoreError::DuplicateKey(DocumentId::new("42.0")))
        );
    }

    #[test]
    fn namespaces_materialize_on_write() {
        let store = MemoryStore::new();

        store
            .update_one(&ns(), &Filter::eq("_id", "a"), &Update::unset("x"), false)
            .unwrap();
        assert!(store.database_names().is_empty());
        assert!(store.list_indexes(&ns()).is_empty());

        let name = store
            .create_index(&ns(), &IndexKeys::ascending("score").then_descending("joined"))
            .unwrap();

        assert_eq!(name, "score_1_joined_-1");
        assert_eq!(store.collection_names("testdb"), vec!["testcoll".to_owned()]);
        assert_eq!(store.list_indexes(&ns()), vec![ID_INDEX.to_owned(), name]);
        assert_eq!(store.create_index(&ns(), &IndexKeys::default()), Err(MemoryStoreError::EmptyIndex));
    }
}
