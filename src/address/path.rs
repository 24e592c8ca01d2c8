use std::fmt::Display;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(From, Display, Debug, Error, Clone, PartialEq, Eq)]
pub struct FieldPathError(String);

/// Dotted path to a field, possibly inside embedded documents (`"stats.kills"`).
///
/// The path is kept verbatim. Segments are only split when a store
/// resolves the path against a document, so a handle never re-interprets
/// the intermediate parts: `"items.0"` means whatever the store says it means
/// (an array element, or a key called `"0"`).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        FieldPath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments of the path, split on `.`.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Append a segment.
    ///
    /// ```
    /// # use anydoc::address::FieldPath;
    /// let path = FieldPath::from("stats").sub("kills");
    /// assert_eq!(path.as_str(), "stats.kills");
    /// ```
    pub fn sub(self, part: impl Display) -> Self {
        if self.0.is_empty() {
            FieldPath(part.to_string())
        } else {
            FieldPath(format!("{}.{part}", self.0))
        }
    }

    /// Checks that no segment is empty (`"a..b"`, `".a"`, `""`).
    pub fn validate(&self) -> Result<(), FieldPathError> {
        if self.parts().any(str::is_empty) {
            return Err(FieldPathError(format!("empty segment in field path {:?}", self.0)));
        }

        Ok(())
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath(value.to_owned())
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        FieldPath(value)
    }
}

impl From<&String> for FieldPath {
    fn from(value: &String) -> Self {
        FieldPath(value.clone())
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.0
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keeps_dotted_paths_verbatim() {
        let path = FieldPath::from("a.b.0.c");

        assert_eq!(path.to_string(), "a.b.0.c");
        assert_eq!(path.parts().collect::<Vec<_>>(), vec!["a", "b", "0", "c"]);
    }

    #[test]
    fn sub_on_empty_path() {
        assert_eq!(FieldPath::from("").sub("x").as_str(), "x");
        assert_eq!(FieldPath::from("x").sub(3).as_str(), "x.3");
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(FieldPath::from("a.b").validate().is_ok());
        assert!(FieldPath::from("a..b").validate().is_err());
        assert!(FieldPath::from(".a").validate().is_err());
        assert!(FieldPath::from("").validate().is_err());
    }
}
