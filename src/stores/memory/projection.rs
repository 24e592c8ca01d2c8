use serde_json::{Map, Value};

use crate::{
    address::{FieldPath, ID_FIELD},
    update::Projection,
};

use super::{
    apply::{assign, overlaps},
    matcher::truthy,
    traverse::{get_mut_parent, get_pathvalue, remove_slot},
    MemoryStoreError,
};

enum Mode<'a> {
    Include(Vec<&'a str>),
    Exclude(Vec<&'a str>),
}

fn mode(projection: &Projection) -> Result<(Mode<'_>, bool), MemoryStoreError> {
    let mut include: Vec<&str> = Vec::new();
    let mut exclude: Vec<&str> = Vec::new();
    let mut with_id = true;

    for (path, flag) in projection.as_map() {
        FieldPath::from(path).validate()?;

        if include.iter().chain(&exclude).any(|p| overlaps(p, path)) {
            return Err(MemoryStoreError::InvalidProjection(format!("path collision at {path}")));
        }

        if path == ID_FIELD {
            with_id = truthy(flag);
        } else if truthy(flag) {
            include.push(path.as_str());
        } else {
            exclude.push(path.as_str());
        }
    }

    if !include.is_empty() && !exclude.is_empty() {
        return Err(MemoryStoreError::InvalidProjection(
            "cannot mix inclusions and exclusions".to_owned(),
        ));
    }

    // `{_id: 1}` alone selects only the id
    let only_id = include.is_empty() && exclude.is_empty() && with_id && !projection.is_empty();

    let mode = if !include.is_empty() || only_id {
        Mode::Include(include)
    } else {
        Mode::Exclude(exclude)
    };

    Ok((mode, with_id))
}

pub fn validate(projection: &Projection) -> Result<(), MemoryStoreError> {
    mode(projection).map(|_| ())
}

/// The fields of `doc` selected by `projection`.
pub fn project(doc: &Value, projection: &Projection) -> Result<Value, MemoryStoreError> {
    let (mode, with_id) = mode(projection)?;

    match mode {
        Mode::Include(paths) => {
            let mut out = Value::Object(Map::new());

            if with_id {
                if let Some(id) = doc.get(ID_FIELD) {
                    assign(&mut out, &FieldPath::from(ID_FIELD), id.clone())?;
                }
            }

            for path in paths {
                if let Some(value) = get_pathvalue(doc, path) {
                    assign(&mut out, &FieldPath::from(path), value.clone())?;
                }
            }

            Ok(out)
        }
        Mode::Exclude(paths) => {
            let mut out = doc.clone();

            let id = (!with_id).then(|| FieldPath::from(ID_FIELD));
            for path in paths.into_iter().map(FieldPath::from).chain(id) {
                if let Some((parent, last)) = get_mut_parent(&mut out, &path, false)? {
                    remove_slot(parent, last);
                }
            }

            Ok(out)
        }
    }
}
