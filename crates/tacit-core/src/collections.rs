//! Collection allow-list.
//!
//! The adapter only ever queries a fixed set of Primary collections. The list
//! is built once at startup and shared read-only across invocations.

use std::collections::BTreeSet;

use crate::defaults::{ATTACHMENTS_COLLECTION, CANDIDATES_COLLECTION};
use crate::error::{Error, Result};

/// Entity type a collection natively stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Candidates,
    Attachments,
    Other,
}

/// Immutable set of collection names the adapter may query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionAllowList {
    names: BTreeSet<String>,
}

impl Default for CollectionAllowList {
    /// The candidate and attachment collections.
    fn default() -> Self {
        Self::new([CANDIDATES_COLLECTION, ATTACHMENTS_COLLECTION])
    }
}

impl CollectionAllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, collection: &str) -> bool {
        self.names.contains(collection)
    }

    /// Reject collections outside the allow-list.
    pub fn check(&self, collection: &str) -> Result<()> {
        if self.is_allowed(collection) {
            return Ok(());
        }
        Err(Error::InvalidCollection(format!(
            "{:?} is not searchable; allowed collections: {}",
            collection,
            self.names().collect::<Vec<_>>().join(", ")
        )))
    }

    /// Allowed names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Classify a collection by the entity it stores.
pub fn collection_kind(collection: &str) -> CollectionKind {
    match collection {
        CANDIDATES_COLLECTION => CollectionKind::Candidates,
        ATTACHMENTS_COLLECTION => CollectionKind::Attachments,
        _ => CollectionKind::Other,
    }
}
