//! Core traits for search backends.
//!
//! The pipeline only talks to backends through [`SearchBackend`], so tests
//! can substitute recording stubs for the HTTP clients.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{CollectionInfo, SearchQuery, SearchResponse};

/// A backend able to execute a built search query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Execute a query against `query.collection`.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;

    /// List collections known to the backend.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        Err(Error::Backend(format!(
            "{} does not support listing collections",
            self.name()
        )))
    }
}
