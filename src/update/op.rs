use serde_json::Value;

use crate::address::FieldPath;

use super::{Amount, Filter, Update};

/// A high-level mutation of one document.
///
/// The variants are store-agnostic; [`UpdateOp::translate`]
/// owns the mapping onto the native update grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Set `path` to `value`, creating the document if needed.
    Assign(FieldPath, Value),
    /// Add `amount` to `path`, creating the field and the document if needed.
    Increment(FieldPath, Amount),
    /// Subtract `amount` from `path` only if the field currently holds at
    /// least `|amount|`. Never creates the document.
    ///
    /// The guard is `field >= |amount|` whatever the sign, so a negative
    /// amount is a guarded *increment*.
    ConditionalDecrement(FieldPath, Amount),
    /// Append one element to the array at `path`, creating it if needed.
    Append(FieldPath, Value),
    PopFirst(FieldPath),
    PopLast(FieldPath),
    /// Remove the field at `path`.
    Unset(FieldPath),
}

/// The native form of an [`UpdateOp`], ready to be sent to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeUpdate {
    pub filter: Filter,
    pub update: Update,
    pub upsert: bool,
}

impl UpdateOp {
    pub fn path(&self) -> &FieldPath {
        match self {
            UpdateOp::Assign(path, _)
            | UpdateOp::Increment(path, _)
            | UpdateOp::ConditionalDecrement(path, _)
            | UpdateOp::Append(path, _)
            | UpdateOp::PopFirst(path)
            | UpdateOp::PopLast(path)
            | UpdateOp::Unset(path) => path,
        }
    }

    /// Short name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateOp::Assign(..) => "assign",
            UpdateOp::Increment(..) => "increment",
            UpdateOp::ConditionalDecrement(..) => "conditional_decrement",
            UpdateOp::Append(..) => "append",
            UpdateOp::PopFirst(..) => "pop_first",
            UpdateOp::PopLast(..) => "pop_last",
            UpdateOp::Unset(..) => "unset",
        }
    }

    /// Whether applying this operation may create the document.
    pub fn upserts(&self) -> bool {
        matches!(
            self,
            UpdateOp::Assign(..) | UpdateOp::Increment(..) | UpdateOp::Append(..)
        )
    }

    /// Build the filter, update document and upsert flag for this
    /// operation, targeting the document matched by `identity`.
    pub fn translate(&self, identity: Filter) -> NativeUpdate {
        let upsert = self.upserts();

        let (filter, update) = match self {
            UpdateOp::Assign(path, value) => (identity, Update::set(path.clone(), value.clone())),
            UpdateOp::Increment(path, amount) => (identity, Update::inc(path.clone(), *amount)),
            UpdateOp::ConditionalDecrement(path, amount) => (
                identity.and(Filter::gte(path.clone(), amount.abs())),
                Update::inc(path.clone(), amount.neg()),
            ),
            UpdateOp::Append(path, value) => (identity, Update::push(path.clone(), value.clone())),
            UpdateOp::PopFirst(path) => (identity, Update::pop_first(path.clone())),
            UpdateOp::PopLast(path) => (identity, Update::pop_last(path.clone())),
            UpdateOp::Unset(path) => (identity, Update::unset(path.clone())),
        };

        NativeUpdate {
            filter,
            update,
            upsert,
        }
    }
}
