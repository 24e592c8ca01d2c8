use serde_json::Value;

use crate::{
    address::{FieldPath, ID_FIELD},
    update::{
        native::{INC, POP, PUSH, SET, SET_ON_INSERT, UNSET},
        Amount, Update,
    },
};

use super::{
    traverse::{get_mut_parent, remove_slot, set_slot, slot, slot_mut, type_name},
    MemoryStoreError,
};

const OPERATORS: [&str; 6] = [SET, INC, PUSH, POP, UNSET, SET_ON_INSERT];

/// Reject updates that can't be applied to any document.
pub fn validate(update: &Update) -> Result<(), MemoryStoreError> {
    if update.is_empty() {
        return Err(MemoryStoreError::EmptyUpdate);
    }

    let mut paths: Vec<&str> = Vec::new();

    for (op, fields) in update.as_map() {
        if !OPERATORS.contains(&op.as_str()) {
            return Err(MemoryStoreError::UnknownOperator(op.clone()));
        }

        let Value::Object(fields) = fields else {
            return Err(MemoryStoreError::InvalidOperand {
                op: op.clone(),
                path: String::new(),
                operand: fields.clone(),
            });
        };

        for path in fields.keys() {
            FieldPath::from(path).validate()?;

            if paths.iter().any(|p| overlaps(p, path)) {
                return Err(MemoryStoreError::ConflictingPaths(path.clone()));
            }
            paths.push(path);
        }
    }

    Ok(())
}

/// Two paths overlap when they're equal or one lies inside the other.
pub(crate) fn overlaps(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    long.starts_with(short) && (long.len() == short.len() || long.as_bytes()[short.len()] == b'.')
}

fn touches_id(path: &str) -> bool {
    overlaps(path, ID_FIELD)
}

/// Apply a validated update to `doc` in place.
///
/// `inserting` is set when `doc` is being created by an upsert: only then
/// `$setOnInsert` applies and `_id` may be written.
pub fn apply_update(doc: &mut Value, update: &Update, inserting: bool) -> Result<(), MemoryStoreError> {
    for (op, path, operand) in update.operations() {
        let path = FieldPath::from(path);

        if op == SET_ON_INSERT && !inserting {
            continue;
        }

        if touches_id(path.as_str()) && op != SET_ON_INSERT {
            let unchanged = op == SET && super::traverse::get_pathvalue(doc, path.as_str()) == Some(operand);

            if !(unchanged || (inserting && op == SET)) {
                return Err(MemoryStoreError::ImmutableId);
            }
        }

        match op {
            SET | SET_ON_INSERT => assign(doc, &path, operand.clone())?,
            INC => increment(doc, &path, operand)?,
            PUSH => push(doc, &path, operand)?,
            POP => pop(doc, &path, operand)?,
            UNSET => unset(doc, &path)?,
            other => return Err(MemoryStoreError::UnknownOperator(other.to_owned())),
        }
    }

    Ok(())
}

pub(crate) fn assign(doc: &mut Value, path: &FieldPath, value: Value) -> Result<(), MemoryStoreError> {
    match get_mut_parent(doc, path, true)? {
        Some((parent, last)) => set_slot(parent, last, path, value),
        None => Ok(()),
    }
}

fn increment(doc: &mut Value, path: &FieldPath, operand: &Value) -> Result<(), MemoryStoreError> {
    let amount = match operand {
        Value::Number(n) => Amount::from_number(n),
        _ => None,
    }
    .ok_or_else(|| MemoryStoreError::InvalidOperand {
        op: INC.to_owned(),
        path: path.to_string(),
        operand: operand.clone(),
    })?;

    let Some((parent, last)) = get_mut_parent(doc, path, true)? else {
        return Ok(());
    };

    let sum = match slot(parent, last) {
        None => Some(amount),
        Some(Value::Number(n)) => Amount::from_number(n).and_then(|current| add(current, amount)),
        Some(other) => {
            return Err(MemoryStoreError::TypeMismatch {
                op: INC.to_owned(),
                path: path.to_string(),
                expected: "number",
                found: type_name(other),
            })
        }
    }
    .ok_or_else(|| MemoryStoreError::Overflow {
        op: INC.to_owned(),
        path: path.to_string(),
    })?;

    set_slot(parent, last, path, sum.to_value())
}

/// Integer sums stay integers; anything involving a float is a float.
fn add(current: Amount, amount: Amount) -> Option<Amount> {
    match (current, amount) {
        (Amount::Int(a), Amount::Int(b)) => a.checked_add(b).map(Amount::Int),
        (a, b) => {
            let sum = a.as_f64() + b.as_f64();
            sum.is_finite().then_some(Amount::Float(sum))
        }
    }
}

fn push(doc: &mut Value, path: &FieldPath, operand: &Value) -> Result<(), MemoryStoreError> {
    let Some((parent, last)) = get_mut_parent(doc, path, true)? else {
        return Ok(());
    };

    match slot_mut(parent, last) {
        Some(Value::Array(arr)) => {
            arr.push(operand.clone());
            Ok(())
        }
        Some(other) => Err(MemoryStoreError::TypeMismatch {
            op: PUSH.to_owned(),
            path: path.to_string(),
            expected: "array",
            found: type_name(other),
        }),
        None => set_slot(parent, last, path, Value::Array(vec![operand.clone()])),
    }
}

fn pop(doc: &mut Value, path: &FieldPath, operand: &Value) -> Result<(), MemoryStoreError> {
    let first = match operand.as_f64() {
        Some(f) if f == -1.0 => true,
        Some(f) if f == 1.0 => false,
        _ => {
            return Err(MemoryStoreError::InvalidOperand {
                op: POP.to_owned(),
                path: path.to_string(),
                operand: operand.clone(),
            })
        }
    };

    let Some((parent, last)) = get_mut_parent(doc, path, false)? else {
        return Ok(());
    };

    match slot_mut(parent, last) {
        Some(Value::Array(arr)) if arr.is_empty() => Ok(()),
        Some(Value::Array(arr)) => {
            if first {
                arr.remove(0);
            } else {
                arr.pop();
            }
            Ok(())
        }
        Some(other) => Err(MemoryStoreError::TypeMismatch {
            op: POP.to_owned(),
            path: path.to_string(),
            expected: "array",
            found: type_name(other),
        }),
        None => Ok(()),
    }
}

fn unset(doc: &mut Value, path: &FieldPath) -> Result<(), MemoryStoreError> {
    if let Some((parent, last)) = get_mut_parent(doc, path, false)? {
        remove_slot(parent, last);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn applied(mut doc: Value, update: Update) -> Result<Value, MemoryStoreError> {
        validate(&update)?;
        apply_update(&mut doc, &update, false)?;
        Ok(doc)
    }

    #[test]
    fn set_creates_paths() {
        let doc = applied(json!({"_id": "a"}), Update::set("stats.kills", 3)).unwrap();

        assert_eq!(doc, json!({"_id": "a", "stats": {"kills": 3}}));
    }

    #[test]
    fn increments() {
        let doc = json!({"_id": "a", "n": 5, "f": 1.5});

        assert_eq!(applied(doc.clone(), Update::inc("n", 2)).unwrap()["n"], json!(7));
        assert_eq!(applied(doc.clone(), Update::inc("n", -7)).unwrap()["n"], json!(-2));
        assert_eq!(applied(doc.clone(), Update::inc("n", 0.5)).unwrap()["n"], json!(5.5));
        assert_eq!(applied(doc.clone(), Update::inc("f", 1)).unwrap()["f"], json!(2.5));
        assert_eq!(applied(doc, Update::inc("missing", 4)).unwrap()["missing"], json!(4));
    }

    #[test]
    fn increment_overflow_is_an_error() {
        let doc = json!({"n": i64::MAX});

        assert!(matches!(
            applied(doc.clone(), Update::inc("n", 1)),
            Err(MemoryStoreError::Overflow { .. })
        ));
        assert_eq!(applied(doc, Update::inc("n", 0)).unwrap()["n"], json!(i64::MAX));
    }

    #[test]
    fn increment_needs_a_number() {
        assert!(matches!(
            applied(json!({"n": "x"}), Update::inc("n", 1)),
            Err(MemoryStoreError::TypeMismatch { expected: "number", found: "string", .. })
        ));
    }

    #[test]
    fn push_and_pop() {
        let doc = applied(json!({}), Update::push("l", 1)).unwrap();
        let doc = applied(doc, Update::push("l", json!([2, 3]))).unwrap();
        assert_eq!(doc, json!({"l": [1, [2, 3]]}));

        let doc = applied(doc, Update::pop_first("l")).unwrap();
        assert_eq!(doc, json!({"l": [[2, 3]]}));

        let doc = applied(doc, Update::pop_last("l")).unwrap();
        assert_eq!(doc, json!({"l": []}));

        let doc = applied(doc, Update::pop_last("l")).unwrap();
        assert_eq!(doc, json!({"l": []}));

        assert_eq!(applied(json!({}), Update::pop_first("l")).unwrap(), json!({}));
        assert!(applied(json!({"l": 1}), Update::push("l", 1)).is_err());
        assert!(applied(json!({"l": 1}), Update::pop_first("l")).is_err());
    }

    #[test]
    fn unset_keeps_siblings() {
        let doc = json!({"a": {"b": 1, "c": 2}});

        assert_eq!(applied(doc.clone(), Update::unset("a.b")).unwrap(), json!({"a": {"c": 2}}));
        assert_eq!(applied(doc.clone(), Update::unset("a.x.y")).unwrap(), doc);
    }

    #[test]
    fn set_on_insert_only_when_inserting() {
        let update = Update::set_on_insert("_id", "a").combine(Update::set("n", 1));

        let mut existing = json!({"_id": "a"});
        apply_update(&mut existing, &update, false).unwrap();
        assert_eq!(existing, json!({"_id": "a", "n": 1}));

        let mut fresh = json!({});
        apply_update(&mut fresh, &update, true).unwrap();
        assert_eq!(fresh, json!({"_id": "a", "n": 1}));
    }

    #[test]
    fn rejects_bad_updates() {
        assert!(matches!(validate(&Update::new()), Err(MemoryStoreError::EmptyUpdate)));
        assert!(matches!(
            validate(&Update::try_from(json!({"$rename": {"a": "b"}})).unwrap()),
            Err(MemoryStoreError::UnknownOperator(_))
        ));
        assert!(matches!(
            validate(&Update::set("a", 1).combine(Update::inc("a.b", 1))),
            Err(MemoryStoreError::ConflictingPaths(_))
        ));
        assert!(matches!(
            validate(&Update::set("a..b", 1)),
            Err(MemoryStoreError::InvalidPath(_))
        ));
        assert!(validate(&Update::set("ab", 1).combine(Update::inc("a", 1))).is_ok());
    }

    #[test]
    fn id_is_immutable() {
        assert!(matches!(
            applied(json!({"_id": "a"}), Update::set("_id", "b")),
            Err(MemoryStoreError::ImmutableId)
        ));
        assert!(applied(json!({"_id": "a"}), Update::set("_id", "a")).is_ok());
    }
}
