//! # tacit-search
//!
//! The search pipeline between the tool boundary and the backends.
//!
//! A tool invocation flows through the query builder ([`query`]), the
//! backend dispatcher with its single fallback ([`dispatch`]), the response
//! normalizer ([`normalize`]) and the text formatter ([`format`]).
//! [`SearchService`] runs that pipeline for each [`Operation`].

pub mod dispatch;
pub mod format;
pub mod normalize;
pub mod operation;
pub mod query;
pub mod service;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod log_capture;

// Re-export main types
pub use dispatch::{BackendRole, Dispatched, Dispatcher, FallbackPolicy, Route};
pub use normalize::{DocumentPage, Entity, EntityKind, EntityPage};
pub use operation::Operation;
pub use query::{RemoteSearchBody, TypesenseParams};
pub use service::SearchService;
