use std::{ops::Deref, sync::Arc};

use serde_json::Value;

use crate::{
    address::{FieldPath, ID_FIELD},
    store::Document,
};

/// An immutable view of a document as a handle last saw it.
///
/// Cloning is cheap; every clone shares the same document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Arc<Document>);

impl Snapshot {
    pub fn new(document: Document) -> Self {
        Snapshot(Arc::new(document))
    }

    /// Resolve a dotted path. Numeric segments index into arrays.
    pub fn get(&self, path: impl Into<FieldPath>) -> Option<&Value> {
        let path = path.into();
        let mut parts = path.parts();

        let mut cur = self.0.get(parts.next()?)?;
        for part in parts {
            cur = match cur {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(cur)
    }

    pub fn contains(&self, path: impl Into<FieldPath>) -> bool {
        self.get(path).is_some()
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get(ID_FIELD)
    }

    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object((*self.0).clone())
    }

    /// Whether both snapshots are the very same fetch.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Snapshot {
    type Target = Document;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Document> for Snapshot {
    fn from(value: Document) -> Self {
        Snapshot::new(value)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn snapshot(value: Value) -> Snapshot {
        match value {
            Value::Object(map) => Snapshot::new(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn resolves_dotted_paths() {
        let s = snapshot(json!({"_id": "a", "stats": {"kills": 3, "list": [10, {"x": 1}]}}));

        assert_eq!(s.id(), Some(&json!("a")));
        assert_eq!(s.get("stats.kills"), Some(&json!(3)));
        assert_eq!(s.get("stats.list.1.x"), Some(&json!(1)));
        assert_eq!(s.get("stats.list.5"), None);
        assert_eq!(s.get("stats.kills.deeper"), None);
        assert!(!s.contains("missing"));
    }

    #[test]
    fn clones_share_the_document() {
        let s = snapshot(json!({"_id": "a"}));
        let c = s.clone();

        assert!(s.ptr_eq(&c));
        assert!(!s.ptr_eq(&snapshot(json!({"_id": "a"}))));
    }
}
