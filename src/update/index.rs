use serde::{Deserialize, Serialize};

use crate::address::FieldPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

/// Key specification of an index: an ordered list of paths with directions.
///
/// ```
/// # use anydoc::update::IndexKeys;
/// let keys = IndexKeys::ascending("score").then_descending("joined");
/// assert_eq!(keys.name(), "score_1_joined_-1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKeys(Vec<(FieldPath, Direction)>);

impl IndexKeys {
    pub fn ascending(path: impl Into<FieldPath>) -> Self {
        IndexKeys(vec![(path.into(), Direction::Ascending)])
    }

    pub fn descending(path: impl Into<FieldPath>) -> Self {
        IndexKeys(vec![(path.into(), Direction::Descending)])
    }

    pub fn and(mut self, path: impl Into<FieldPath>, direction: Direction) -> Self {
        self.0.push((path.into(), direction));
        self
    }

    pub fn then_ascending(self, path: impl Into<FieldPath>) -> Self {
        self.and(path, Direction::Ascending)
    }

    pub fn then_descending(self, path: impl Into<FieldPath>) -> Self {
        self.and(path, Direction::Descending)
    }

    /// The name a store gives to an index with these keys, when none is supplied.
    pub fn name(&self) -> String {
        self.0
            .iter()
            .map(|(path, dir)| format!("{path}_{}", dir.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn keys(&self) -> &[(FieldPath, Direction)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
