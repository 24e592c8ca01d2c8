use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::FieldPath;

/// Field inclusion/exclusion for fetches.
///
/// `_id` comes back unless it's excluded explicitly. Apart from `_id`,
/// a projection is either all inclusions or all exclusions; stores reject
/// a mix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projection(Map<String, Value>);

impl Projection {
    pub fn include<P: Into<FieldPath>>(paths: impl IntoIterator<Item = P>) -> Self {
        Projection::with(paths, 1)
    }

    pub fn exclude<P: Into<FieldPath>>(paths: impl IntoIterator<Item = P>) -> Self {
        Projection::with(paths, 0)
    }

    fn with<P: Into<FieldPath>>(paths: impl IntoIterator<Item = P>, flag: i64) -> Self {
        Projection(
            paths
                .into_iter()
                .map(|p| (p.into().into(), Value::from(flag)))
                .collect(),
        )
    }

    /// Combine several projections into one.
    pub fn fields(projections: impl IntoIterator<Item = Projection>) -> Self {
        Projection(projections.into_iter().flat_map(|p| p.0).collect())
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

impl From<Map<String, Value>> for Projection {
    fn from(value: Map<String, Value>) -> Self {
        Projection(value)
    }
}
