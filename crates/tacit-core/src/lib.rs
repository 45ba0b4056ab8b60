//! # tacit-core
//!
//! Core types, traits, and abstractions for the tacit candidate search adapter.
//!
//! This crate provides the request records and parameter decoding, the
//! collection allow-list, the backend trait, and the shared error type that
//! the other tacit crates depend on.

pub mod collections;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod params;
pub mod traits;

// Re-export commonly used types at crate root
pub use collections::{collection_kind, CollectionAllowList, CollectionKind};
pub use error::{Error, Result, Stage};
pub use models::*;
pub use params::{
    decode, AttachmentSearchParams, FieldList, SearchParams, SemanticSearchParams,
    VectorSearchParams,
};
pub use traits::SearchBackend;
