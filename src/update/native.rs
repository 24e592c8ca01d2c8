use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::FieldPath;

use super::Amount;

/// Update operators understood by the stores.
pub const SET: &str = "$set";
pub const INC: &str = "$inc";
pub const PUSH: &str = "$push";
pub const POP: &str = "$pop";
pub const UNSET: &str = "$unset";
pub const SET_ON_INSERT: &str = "$setOnInsert";

/// An update document in the store's native shape: operator → `{path: operand}`.
///
/// Fragments can be combined, as long as they don't touch the same path:
///
/// ```
/// # use anydoc::update::Update;
/// # use serde_json::json;
/// let update = Update::set("name", "toon").combine(Update::inc("level", 1));
///
/// assert_eq!(update.to_value(), json!({"$set": {"name": "toon"}, "$inc": {"level": 1}}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Update(Map<String, Value>);

impl Update {
    pub fn new() -> Self {
        Update(Map::new())
    }

    fn fragment(op: &str, path: FieldPath, operand: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(path.into(), operand);

        let mut map = Map::new();
        map.insert(op.to_owned(), Value::Object(fields));
        Update(map)
    }

    pub fn set(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Update::fragment(SET, path.into(), value.into())
    }

    pub fn inc(path: impl Into<FieldPath>, amount: impl Into<Amount>) -> Self {
        Update::fragment(INC, path.into(), amount.into().to_value())
    }

    /// Appends `value` as one element, even if it's an array itself.
    pub fn push(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Update::fragment(PUSH, path.into(), value.into())
    }

    pub fn pop_first(path: impl Into<FieldPath>) -> Self {
        Update::fragment(POP, path.into(), Value::from(-1))
    }

    pub fn pop_last(path: impl Into<FieldPath>) -> Self {
        Update::fragment(POP, path.into(), Value::from(1))
    }

    pub fn unset(path: impl Into<FieldPath>) -> Self {
        Update::fragment(UNSET, path.into(), Value::String(String::new()))
    }

    pub fn set_on_insert(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Update::fragment(SET_ON_INSERT, path.into(), value.into())
    }

    /// Merge the operators of `other` into this update.
    ///
    /// A path that appears under the same operator in both is taken from `other`.
    pub fn combine(mut self, other: Update) -> Self {
        for (op, fields) in other.0 {
            match (self.0.get_mut(&op), fields) {
                (Some(Value::Object(existing)), Value::Object(fields)) => existing.extend(fields),
                (_, fields) => {
                    self.0.insert(op, fields);
                }
            }
        }

        self
    }

    /// Iterate over `(operator, path, operand)` triples.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.0.iter().flat_map(|(op, fields)| {
            fields
                .as_object()
                .into_iter()
                .flat_map(move |fields| fields.iter().map(move |(path, v)| (op.as_str(), path.as_str(), v)))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Update {
    fn from(value: Map<String, Value>) -> Self {
        Update(value)
    }
}

impl TryFrom<Value> for Update {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Update(map)),
            other => Err(other),
        }
    }
}
