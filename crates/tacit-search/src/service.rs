//! Per-operation search pipeline.
//!
//! Decode, guard, build, dispatch, normalize and format, in that order. The
//! service owns only the process-wide backend handles and the allow-list; a
//! call shares nothing else with concurrent calls.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value as JsonValue};
use tracing::field::{display, Empty};
use tracing::{debug, info, instrument, Span};

use tacit_core::defaults::CANDIDATES_COLLECTION;
use tacit_core::logging::{BACKEND, DROPPED, DURATION_MS, FOUND, RESULT_COUNT};
use tacit_core::{
    decode, AttachmentSearchParams, CollectionAllowList, Error, Result, SearchBackend,
    SearchParams, SearchQuery, SemanticSearchParams, VectorSearchParams,
};

use crate::dispatch::{Dispatcher, FallbackPolicy, Route};
use crate::format::{format_collections, format_documents, format_entities};
use crate::normalize::{
    normalize_documents, normalize_entities, precedence_for, Precedence, ATTACHMENT_FIRST,
    CANDIDATE_FIRST,
};
use crate::operation::Operation;
use crate::query::{
    build_attachment_query, build_search_query, build_semantic_query, build_vector_query,
};

/// Presentation requested for `search_collection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presentation {
    Entities,
    Documents,
}

impl Presentation {
    fn parse(format: Option<&str>) -> Result<Self> {
        match format.map(str::trim) {
            None | Some("") | Some("entities") => Ok(Self::Entities),
            Some("documents") => Ok(Self::Documents),
            Some(other) => Err(Error::Decode(format!(
                "unknown format {:?}; expected \"entities\" or \"documents\"",
                other
            ))),
        }
    }
}

/// A built query together with how its result is presented.
struct Plan {
    query: SearchQuery,
    route: Route,
    presentation: Presentation,
    precedence: Precedence,
}

/// Search pipeline shared by every tool invocation.
#[derive(Clone)]
pub struct SearchService {
    dispatcher: Dispatcher,
    allow_list: Arc<CollectionAllowList>,
    fallback: FallbackPolicy,
}

impl SearchService {
    pub fn new(
        primary: Arc<dyn SearchBackend>,
        secondary: Arc<dyn SearchBackend>,
        allow_list: Arc<CollectionAllowList>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(primary, secondary),
            allow_list,
            fallback,
        }
    }

    pub fn allow_list(&self) -> &CollectionAllowList {
        &self.allow_list
    }

    /// Run `op` with the caller's parameters and render the result.
    #[instrument(skip(self, op, params), fields(
        subsystem = "search",
        component = "service",
        op = %op,
        backend = Empty,
        found = Empty,
        result_count = Empty,
        dropped = Empty,
        duration_ms = Empty,
    ))]
    pub async fn execute(&self, op: Operation, params: &Map<String, JsonValue>) -> Result<String> {
        let start = Instant::now();

        if op == Operation::ListCollections {
            return self.list_collections().await;
        }

        let plan = self.plan(op, params)?;
        debug!(
            collection = %plan.query.collection,
            query = %plan.query.q,
            route = ?plan.route,
            page = plan.query.page,
            per_page = plan.query.per_page,
            "Query built"
        );

        let dispatched = self.dispatcher.dispatch(&plan.query, plan.route).await?;
        let found = dispatched.response.found;

        let (text, shown, dropped) = match plan.presentation {
            Presentation::Entities => {
                let page = normalize_entities(dispatched.response, plan.precedence);
                (format_entities(&page), page.entities.len(), page.dropped())
            }
            Presentation::Documents => {
                let page = normalize_documents(dispatched.response);
                (format_documents(&page), page.documents.len(), 0)
            }
        };

        let span = Span::current();
        span.record(BACKEND, display(dispatched.served_by));
        span.record(FOUND, found);
        span.record(RESULT_COUNT, shown as u64);
        span.record(DROPPED, dropped as u64);
        span.record(DURATION_MS, start.elapsed().as_millis() as u64);
        info!("Operation complete");
        Ok(text)
    }

    /// Decode, guard and build. Nothing here touches a backend.
    fn plan(&self, op: Operation, params: &Map<String, JsonValue>) -> Result<Plan> {
        let cap = op.per_page_cap();
        let route = op.route(self.fallback);

        let plan = match op {
            Operation::SearchCandidates | Operation::StagingSearchCandidates => {
                let mut req = decode::<SearchParams>(params, "search request")?.into_request(cap)?;
                req.collection = CANDIDATES_COLLECTION.to_string();
                Plan {
                    query: build_search_query(&req),
                    route,
                    presentation: Presentation::Entities,
                    precedence: CANDIDATE_FIRST,
                }
            }
            Operation::SearchAttachments => {
                let req = decode::<AttachmentSearchParams>(params, "attachment search request")?
                    .into_request(cap)?;
                Plan {
                    query: build_attachment_query(&req),
                    route,
                    presentation: Presentation::Entities,
                    precedence: ATTACHMENT_FIRST,
                }
            }
            Operation::VectorSearchCandidates => {
                let req = decode::<VectorSearchParams>(params, "vector search request")?
                    .into_request(cap)?;
                Plan {
                    query: build_vector_query(&req),
                    route,
                    presentation: Presentation::Entities,
                    precedence: CANDIDATE_FIRST,
                }
            }
            Operation::SemanticSearchCandidates => {
                let req = decode::<SemanticSearchParams>(params, "semantic search request")?
                    .into_request(cap)?;
                Plan {
                    query: build_semantic_query(&req),
                    route,
                    presentation: Presentation::Entities,
                    precedence: CANDIDATE_FIRST,
                }
            }
            Operation::SearchCollection => {
                let raw = decode::<SearchParams>(params, "collection search request")?;
                let presentation = Presentation::parse(raw.format.as_deref())?;
                let req = raw.into_request(cap)?;
                if req.collection.trim().is_empty() {
                    return Err(Error::Decode(
                        "missing required parameter `collection`".to_string(),
                    ));
                }
                self.allow_list.check(&req.collection)?;
                Plan {
                    precedence: precedence_for(&req.collection),
                    query: build_search_query(&req),
                    route,
                    presentation,
                }
            }
            Operation::ListCollections => {
                return Err(Error::Decode(
                    "list_collections does not build a search query".to_string(),
                ))
            }
        };

        Ok(plan)
    }

    async fn list_collections(&self) -> Result<String> {
        let available = self.dispatcher.list_collections().await?;
        debug!(
            result_count = available.len(),
            "Listed collections on primary"
        );
        Ok(format_collections(&self.allow_list, &available))
    }
}
