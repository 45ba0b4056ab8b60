//! Backend dispatch with single-shot fallback.
//!
//! Every invocation makes at most two outbound calls, sequentially: the
//! Primary, then the Secondary only when the route allows it and the Primary
//! failed with a fallback-eligible error.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use tacit_core::{CollectionInfo, Error, Result, SearchBackend, SearchQuery, SearchResponse};

/// Which backend(s) a call may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Primary only; failures propagate untouched.
    Primary,
    /// Primary, retried once on the Secondary after a backend failure.
    PrimaryWithFallback,
    /// Secondary only.
    Secondary,
}

/// Whether fallback-capable operations may fall back to the Secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    #[default]
    Enabled,
    Disabled,
}

impl FallbackPolicy {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Backend role that answered a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRole {
    Primary,
    Secondary,
}

impl fmt::Display for BackendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Response plus the backend that produced it.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub response: SearchResponse,
    pub served_by: BackendRole,
}

/// Holds the process-wide backend handles.
#[derive(Clone)]
pub struct Dispatcher {
    primary: Arc<dyn SearchBackend>,
    secondary: Arc<dyn SearchBackend>,
}

impl Dispatcher {
    pub fn new(primary: Arc<dyn SearchBackend>, secondary: Arc<dyn SearchBackend>) -> Self {
        Self { primary, secondary }
    }

    #[instrument(skip(self, query, route), fields(
        subsystem = "search",
        component = "dispatcher",
        collection = %query.collection,
        ?route,
    ))]
    pub async fn dispatch(&self, query: &SearchQuery, route: Route) -> Result<Dispatched> {
        let start = Instant::now();

        let dispatched = match route {
            Route::Primary => self.call(BackendRole::Primary, query).await,
            Route::Secondary => self.call(BackendRole::Secondary, query).await,
            Route::PrimaryWithFallback => match self.call(BackendRole::Primary, query).await {
                Ok(dispatched) => Ok(dispatched),
                Err(primary_err) if primary_err.is_fallback_eligible() => {
                    warn!(
                        backend = %self.primary.name(),
                        error = %primary_err,
                        "Primary search failed, falling back to secondary"
                    );
                    self.call(BackendRole::Secondary, query)
                        .await
                        .map_err(|secondary_err| Error::Fallback {
                            primary: Box::new(primary_err),
                            secondary: Box::new(secondary_err),
                        })
                }
                Err(primary_err) => Err(primary_err),
            },
        }?;

        debug!(
            backend = %dispatched.served_by,
            found = dispatched.response.found,
            result_count = dispatched.response.hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Dispatch complete"
        );

        Ok(dispatched)
    }

    /// List collections on the Primary.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        self.primary.list_collections().await
    }

    async fn call(&self, role: BackendRole, query: &SearchQuery) -> Result<Dispatched> {
        let backend = match role {
            BackendRole::Primary => &self.primary,
            BackendRole::Secondary => &self.secondary,
        };
        let response = backend.search(query).await?;
        Ok(Dispatched {
            response,
            served_by: role,
        })
    }
}
