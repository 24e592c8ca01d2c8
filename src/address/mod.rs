use std::fmt::Display;

use derive_more::Display;
use serde::{Deserialize, Serialize};

mod path;

pub use path::*;

/// Name of the identity field of every document.
pub const ID_FIELD: &str = "_id";

/// Identity of a document within its collection.
///
/// Any `Display` value can be an id; it's always stored and queried in its
/// string form, so `DocumentId::new(42)` and `DocumentId::new("42")` address
/// the same document.
#[derive(Debug, Display, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Display) -> Self {
        DocumentId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A collection inside a database.
#[derive(Debug, Display, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[display(fmt = "{}.{}", database, collection)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Namespace {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_are_stringified() {
        assert_eq!(DocumentId::new(42), DocumentId::new("42"));
        assert_eq!(DocumentId::new(42).as_str(), "42");

        let uuid = uuid::Uuid::new_v4();
        assert_eq!(DocumentId::new(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn namespace_display() {
        assert_eq!(Namespace::new("testdb", "testcoll").to_string(), "testdb.testcoll");
    }
}
