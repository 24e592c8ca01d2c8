//! The update language: abstract [`UpdateOp`]s and the native
//! [`Filter`], [`Update`], [`Projection`] and [`IndexKeys`] documents
//! they're translated into.

use serde::{Deserialize, Serialize};

mod amount;
mod filter;
mod index;
pub mod native;
mod op;
mod projection;

pub use amount::*;
pub use filter::*;
pub use index::*;
pub use native::Update;
pub use op::*;
pub use projection::*;

use crate::address::DocumentId;

/// What a single-document update did.
///
/// `modified_count > 0` is the only reliable "it was applied" signal:
/// a guarded update whose guard didn't hold comes back as a successful
/// outcome with nothing modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    /// Set only when the update created a new document.
    pub upserted_id: Option<DocumentId>,
}

impl UpdateOutcome {
    pub fn applied(&self) -> bool {
        self.modified_count > 0
    }

    pub fn upserted(&self) -> bool {
        self.upserted_id.is_some()
    }
}

/// Which version of the document a find-and-modify returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnDocument {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndUpdateOptions {
    pub upsert: bool,
    pub projection: Option<Projection>,
    pub return_document: ReturnDocument,
}

impl FindOneAndUpdateOptions {
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn projection(mut self, projection: Option<Projection>) -> Self {
        self.projection = projection;
        self
    }

    pub fn return_document(mut self, return_document: ReturnDocument) -> Self {
        self.return_document = return_document;
        self
    }
}
