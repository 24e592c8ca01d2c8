use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::update::Comparison;

use super::{traverse::get_pathvalue, MemoryStoreError};

/// Whether `doc` satisfies every predicate of `filter`.
pub fn matches(doc: &Value, filter: &Map<String, Value>) -> Result<bool, MemoryStoreError> {
    for (key, cond) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let clauses = cond
                    .as_array()
                    .ok_or_else(|| MemoryStoreError::InvalidFilter("$and needs an array".to_owned()))?;

                let mut all = true;
                for clause in clauses {
                    let clause = clause.as_object().ok_or_else(|| {
                        MemoryStoreError::InvalidFilter("$and clauses must be documents".to_owned())
                    })?;

                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            op if op.starts_with('$') => return Err(MemoryStoreError::UnknownOperator(op.to_owned())),
            path => matches_field(get_pathvalue(doc, path), cond)?,
        };

        if !ok {
            return Ok(false);
        }
    }

    Ok(true)
}

fn is_operator_document(cond: &Value) -> bool {
    match cond {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_field(value: Option<&Value>, cond: &Value) -> Result<bool, MemoryStoreError> {
    let Value::Object(ops) = cond else {
        return Ok(equals(value, cond));
    };
    if !is_operator_document(cond) {
        return Ok(equals(value, cond));
    }

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$exists" => value.is_some() == truthy(operand),
            op => match Comparison::from_operator(op) {
                Some(Comparison::Ne) => !equals(value, operand),
                Some(cmp) => compares(value, cmp, operand),
                None => return Err(MemoryStoreError::UnknownOperator(op.to_owned())),
            },
        };

        if !ok {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Candidates for comparison: the value itself and, for arrays, each element.
fn candidates(value: &Value) -> impl Iterator<Item = &Value> {
    std::iter::once(value).chain(value.as_array().into_iter().flatten())
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        // a missing field equals null
        None => expected.is_null(),
        Some(value) => candidates(value).any(|c| values_equal(c, expected)),
    }
}

fn compares(value: Option<&Value>, cmp: Comparison, operand: &Value) -> bool {
    let Some(value) = value else {
        return false;
    };

    candidates(value).any(|c| match compare_values(c, operand) {
        Some(ord) => match cmp {
            Comparison::Gt => ord == Ordering::Greater,
            Comparison::Gte => ord != Ordering::Less,
            Comparison::Lt => ord == Ordering::Less,
            Comparison::Lte => ord != Ordering::Greater,
            Comparison::Ne => ord != Ordering::Equal,
        },
        None => false,
    })
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    }
}

/// Equality with numbers compared by value (`1 == 1.0`).
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, a)| y.get(k).map(|b| values_equal(a, b)).unwrap_or(false))
        }
        _ => a == b,
    }
}

/// Order of two values of the same kind; `None` across kinds.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
