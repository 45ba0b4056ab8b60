//! Stub search backend for deterministic testing.
//!
//! Records every query it receives so tests can assert whether, and with
//! what, a backend was invoked.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tacit_search::mock::StubBackend;
//!
//! let primary = StubBackend::new("primary")
//!     .failing_with(|| Error::Backend("connection refused".into()));
//! let secondary = StubBackend::new("secondary").with_response(response);
//! // ... run the pipeline ...
//! assert_eq!(secondary.call_count(), 1);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tacit_core::{CollectionInfo, Error, Result, SearchBackend, SearchQuery, SearchResponse};

type ErrorFactory = Arc<dyn Fn() -> Error + Send + Sync>;

/// Stub backend returning a fixed response or a fixed failure.
#[derive(Clone)]
pub struct StubBackend {
    name: String,
    response: SearchResponse,
    collections: Vec<CollectionInfo>,
    failure: Option<ErrorFactory>,
    call_log: Arc<Mutex<Vec<SearchQuery>>>,
}

impl StubBackend {
    /// Create a stub answering every query with an empty response.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: SearchResponse {
                page: 1,
                per_page: 10,
                ..Default::default()
            },
            collections: Vec::new(),
            failure: None,
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every search with `response`.
    pub fn with_response(mut self, response: SearchResponse) -> Self {
        self.response = response;
        self
    }

    /// Answer collection listings with `collections`.
    pub fn with_collections(mut self, collections: Vec<CollectionInfo>) -> Self {
        self.collections = collections;
        self
    }

    /// Fail every call with the error produced by `factory`.
    pub fn failing_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.failure = Some(Arc::new(factory));
        self
    }

    /// All search queries received, in order.
    pub fn calls(&self) -> Vec<SearchQuery> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.call_log.lock().unwrap().push(query.clone());
        match self.failure {
            Some(ref factory) => Err(factory()),
            None => Ok(self.response.clone()),
        }
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        match self.failure {
            Some(ref factory) => Err(factory()),
            None => Ok(self.collections.clone()),
        }
    }
}
