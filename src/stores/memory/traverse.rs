use serde_json::{Map, Value};

use crate::address::FieldPath;

use super::MemoryStoreError;

/// Highest array index a write may pad up to.
pub const MAX_ARRAY_INDEX: usize = 1 << 16;

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Grow `arr` with nulls so that `ix` is a valid index.
fn pad(arr: &mut Vec<Value>, ix: usize, path: &FieldPath) -> Result<(), MemoryStoreError> {
    if ix > MAX_ARRAY_INDEX {
        return Err(MemoryStoreError::IndexTooLarge {
            path: path.to_string(),
            index: ix,
        });
    }

    if ix >= arr.len() {
        arr.resize(ix + 1, Value::Null);
    }

    Ok(())
}

/// Read the value at a dotted path. Numeric segments index into arrays.
pub fn get_pathvalue<'a>(cur: &'a Value, path: &str) -> Option<&'a Value> {
    let mut c = cur;

    for part in path.split('.') {
        c = match c {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(c)
}

fn get_mut_subvalue<'a>(
    cur: &'a mut Value,
    part: &str,
    path: &FieldPath,
    create_on_miss: bool,
) -> Result<Option<&'a mut Value>, MemoryStoreError> {
    match cur {
        Value::Object(map) => {
            if !map.contains_key(part) {
                if !create_on_miss {
                    return Ok(None);
                }

                map.insert(part.to_owned(), Value::Object(Map::new()));
            }

            Ok(map.get_mut(part))
        }
        Value::Array(arr) => {
            let Ok(ix) = part.parse::<usize>() else {
                return if create_on_miss {
                    Err(MemoryStoreError::PathConflict {
                        path: path.to_string(),
                        found: "array".to_owned(),
                    })
                } else {
                    Ok(None)
                };
            };

            if ix >= arr.len() {
                if !create_on_miss {
                    return Ok(None);
                }

                pad(arr, ix, path)?;
                arr[ix] = Value::Object(Map::new());
            }

            Ok(arr.get_mut(ix))
        }
        other if create_on_miss => Err(MemoryStoreError::PathConflict {
            path: path.to_string(),
            found: type_name(other).to_owned(),
        }),
        _ => Ok(None),
    }
}

/// The container holding the last segment of `path`, and that segment.
///
/// With `create_on_miss`, missing intermediate documents are created and
/// running into a scalar is an error; without it, both end the walk with
/// `None`.
pub fn get_mut_parent<'a, 'p>(
    root: &'a mut Value,
    path: &'p FieldPath,
    create_on_miss: bool,
) -> Result<Option<(&'a mut Value, &'p str)>, MemoryStoreError> {
    let mut parts: Vec<&str> = path.parts().collect();
    let Some(last) = parts.pop() else {
        return Ok(None);
    };

    let mut c = root;

    for part in parts {
        c = match get_mut_subvalue(c, part, path, create_on_miss)? {
            Some(c) => c,
            None => return Ok(None),
        };
    }

    Ok(Some((c, last)))
}

/// The value under `key` in a container.
pub fn slot<'a>(parent: &'a Value, key: &str) -> Option<&'a Value> {
    match parent {
        Value::Object(map) => map.get(key),
        Value::Array(arr) => arr.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

pub fn slot_mut<'a>(parent: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match parent {
        Value::Object(map) => map.get_mut(key),
        Value::Array(arr) => arr.get_mut(key.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Store `value` under `key`, padding arrays with nulls.
pub fn set_slot(
    parent: &mut Value,
    key: &str,
    path: &FieldPath,
    value: Value,
) -> Result<(), MemoryStoreError> {
    match parent {
        Value::Object(map) => {
            map.insert(key.to_owned(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let ix = key.parse::<usize>().map_err(|_| MemoryStoreError::PathConflict {
                path: path.to_string(),
                found: "array".to_owned(),
            })?;

            pad(arr, ix, path)?;
            arr[ix] = value;

            Ok(())
        }
        other => Err(MemoryStoreError::PathConflict {
            path: path.to_string(),
            found: type_name(other).to_owned(),
        }),
    }
}

/// Remove `key` from a container. Array elements are nulled rather than
/// removed, so the other indexes don't shift.
pub fn remove_slot(parent: &mut Value, key: &str) {
    match parent {
        Value::Object(map) => {
            map.remove(key);
        }
        Value::Array(arr) => {
            if let Some(v) = key.parse::<usize>().ok().and_then(|ix| arr.get_mut(ix)) {
                *v = Value::Null;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_nested_values() {
        let v = json!({"a": {"b": [1, {"c": 2}]}});

        assert_eq!(get_pathvalue(&v, "a.b.1.c"), Some(&json!(2)));
        assert_eq!(get_pathvalue(&v, "a.b.7"), None);
        assert_eq!(get_pathvalue(&v, "a.x"), None);
    }

    #[test]
    fn creates_intermediate_documents() {
        let mut v = json!({"a": 1});
        let path = FieldPath::from("b.c.d");

        let (parent, last) = get_mut_parent(&mut v, &path, true).unwrap().unwrap();
        set_slot(parent, last, &path, json!(5)).unwrap();

        assert_eq!(v, json!({"a": 1, "b": {"c": {"d": 5}}}));
    }

    #[test]
    fn scalar_in_the_way() {
        let mut v = json!({"a": 1});
        let path = FieldPath::from("a.b");

        assert!(matches!(
            get_mut_parent(&mut v, &path, true),
            Err(MemoryStoreError::PathConflict { .. })
        ));
        assert!(get_mut_parent(&mut v, &path, false).unwrap().is_none());
    }

    #[test]
    fn array_slots() {
        let mut v = json!({"l": [1, 2]});
        let path = FieldPath::from("l.3");

        let (parent, last) = get_mut_parent(&mut v, &path, true).unwrap().unwrap();
        set_slot(parent, last, &path, json!(9)).unwrap();
        assert_eq!(v, json!({"l": [1, 2, null, 9]}));

        let (parent, last) = get_mut_parent(&mut v, &path, false).unwrap().unwrap();
        remove_slot(parent, last);
        assert_eq!(v, json!({"l": [1, 2, null, null]}));
    }

    #[test]
    fn array_padding_is_bounded() {
        let mut v = json!({"l": [1], "m": [[]]});

        for ix in [MAX_ARRAY_INDEX + 1, 4_000_000_000, usize::MAX] {
            let path = FieldPath::from(format!("l.{ix}"));
            let (parent, last) = get_mut_parent(&mut v, &path, true).unwrap().unwrap();
            assert!(matches!(
                set_slot(parent, last, &path, json!(9)),
                Err(MemoryStoreError::IndexTooLarge { index, .. }) if index == ix
            ));

            let path = FieldPath::from(format!("m.{ix}.x"));
            assert!(matches!(
                get_mut_parent(&mut v, &path, true),
                Err(MemoryStoreError::IndexTooLarge { .. })
            ));
        }
        assert_eq!(v, json!({"l": [1], "m": [[]]}));

        let path = FieldPath::from(format!("l.{MAX_ARRAY_INDEX}"));
        let (parent, last) = get_mut_parent(&mut v, &path, true).unwrap().unwrap();
        set_slot(parent, last, &path, json!(9)).unwrap();
        assert_eq!(v["l"].as_array().map(Vec::len), Some(MAX_ARRAY_INDEX + 1));
    }
}
