use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::FieldPath;

/// Comparison operators usable in a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn operator(self) -> &'static str {
        match self {
            Comparison::Ne => "$ne",
            Comparison::Gt => "$gt",
            Comparison::Gte => "$gte",
            Comparison::Lt => "$lt",
            Comparison::Lte => "$lte",
        }
    }

    pub fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "$ne" => Comparison::Ne,
            "$gt" => Comparison::Gt,
            "$gte" => Comparison::Gte,
            "$lt" => Comparison::Lt,
            "$lte" => Comparison::Lte,
            _ => return None,
        })
    }
}

/// A filter document in the store's native shape.
///
/// ```
/// # use anydoc::update::Filter;
/// # use serde_json::json;
/// let filter = Filter::eq("_id", "abc").and(Filter::gte("balance", 10));
///
/// assert_eq!(
///     filter.to_value(),
///     json!({"$and": [{"_id": "abc"}, {"balance": {"$gte": 10}}]})
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Filter(Map::new())
    }

    pub fn eq(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::single(path.into(), value.into())
    }

    pub fn compare(path: impl Into<FieldPath>, cmp: Comparison, value: impl Into<Value>) -> Self {
        Filter::single(path.into(), operator(cmp.operator(), value.into()))
    }

    pub fn ne(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::compare(path, Comparison::Ne, value)
    }

    pub fn gt(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::compare(path, Comparison::Gt, value)
    }

    pub fn gte(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::compare(path, Comparison::Gte, value)
    }

    pub fn lt(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::compare(path, Comparison::Lt, value)
    }

    pub fn lte(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::compare(path, Comparison::Lte, value)
    }

    pub fn exists(path: impl Into<FieldPath>, exists: bool) -> Self {
        Filter::single(path.into(), operator("$exists", Value::Bool(exists)))
    }

    /// Conjunction of `self` and `other`.
    ///
    /// Conjoining onto an existing `$and` extends it instead of nesting.
    pub fn and(self, other: Filter) -> Self {
        if self.0.is_empty() {
            return other;
        }
        if other.0.is_empty() {
            return self;
        }

        let mut clauses = self.into_clauses();
        clauses.extend(other.into_clauses());

        Filter::all_of(clauses)
    }

    /// Conjunction of all the filters.
    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        let clauses: Vec<Value> = filters
            .into_iter()
            .filter(|f| !f.0.is_empty())
            .map(|f| Value::Object(f.0))
            .collect();

        match clauses.len() {
            0 => Filter::all(),
            1 => match clauses.into_iter().next() {
                Some(Value::Object(map)) => Filter(map),
                _ => Filter::all(),
            },
            _ => Filter::single_key("$and", Value::Array(clauses)),
        }
    }

    fn into_clauses(self) -> Vec<Filter> {
        if self.0.len() == 1 {
            if let Some(Value::Array(clauses)) = self.0.get("$and") {
                return clauses
                    .iter()
                    .filter_map(|c| c.as_object().cloned().map(Filter))
                    .collect();
            }
        }

        vec![self]
    }

    fn single(path: FieldPath, value: Value) -> Self {
        Filter::single_key(path.as_str(), value)
    }

    fn single_key(key: &str, value: Value) -> Self {
        let mut map = Map::new();
        map.insert(key.to_owned(), value);
        Filter(map)
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

fn operator(op: &str, operand: Value) -> Value {
    let mut map = Map::new();
    map.insert(op.to_owned(), operand);
    Value::Object(map)
}

impl From<Map<String, Value>> for Filter {
    fn from(value: Map<String, Value>) -> Self {
        Filter(value)
    }
}

impl TryFrom<Value> for Filter {
    type Error = Value;

    /// Only JSON objects are filters; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Filter(map)),
            other => Err(other),
        }
    }
}
