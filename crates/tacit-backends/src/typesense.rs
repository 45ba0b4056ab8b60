//! Primary backend: Typesense REST API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use tacit_core::defaults;
use tacit_core::{
    CollectionInfo, Error, FacetCount, Hit, Result, SearchBackend, SearchQuery, SearchResponse,
};
use tacit_search::TypesenseParams;

use crate::config::TypesenseConfig;

/// Header carrying the Typesense API key.
pub const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Search response as Typesense returns it. Every field may be absent.
#[derive(Debug, Deserialize)]
struct TypesenseSearchResult {
    #[serde(default)]
    found: u64,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    request_params: Option<RequestParams>,
    #[serde(default)]
    hits: Vec<Hit>,
    #[serde(default)]
    grouped_hits: Vec<GroupedHits>,
    #[serde(default)]
    facet_counts: Vec<FacetCount>,
}

#[derive(Debug, Deserialize)]
struct RequestParams {
    #[serde(default)]
    per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GroupedHits {
    #[serde(default)]
    hits: Vec<Hit>,
}

impl From<TypesenseSearchResult> for SearchResponse {
    fn from(result: TypesenseSearchResult) -> Self {
        let mut hits = result.hits;
        // Grouped results are flattened in group order.
        for group in result.grouped_hits {
            hits.extend(group.hits);
        }

        SearchResponse {
            found: result.found,
            page: result.page.unwrap_or(defaults::PAGE),
            per_page: result
                .request_params
                .and_then(|p| p.per_page)
                .unwrap_or(defaults::PER_PAGE),
            hits,
            facet_counts: result.facet_counts,
        }
    }
}

/// Typesense search backend.
pub struct TypesenseBackend {
    client: Client,
    config: TypesenseConfig,
    base_url: Url,
}

impl TypesenseBackend {
    pub fn new(config: TypesenseConfig, timeout: Duration) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url())
            .map_err(|e| Error::Config(format!("Invalid Typesense URL: {}", e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "backends",
            component = "typesense",
            url = %base_url,
            "Initializing Typesense backend"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &TypesenseConfig {
        &self.config
    }

    /// Build an endpoint URL from path segments, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Backend(format!(
            "Typesense returned status {}: {}",
            status, body
        )))
    }
}

#[async_trait]
impl SearchBackend for TypesenseBackend {
    fn name(&self) -> &str {
        "typesense"
    }

    #[instrument(skip(self, query), fields(
        subsystem = "backends",
        component = "typesense",
        collection = %query.collection,
    ))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let start = Instant::now();
        let url = self.endpoint(&["collections", &query.collection, "documents", "search"])?;
        let params = TypesenseParams::from(query);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("Typesense request failed: {}", e)))?;

        let result: TypesenseSearchResult = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Failed to decode Typesense response: {}", e)))?;

        let response = SearchResponse::from(result);
        debug!(
            found = response.found,
            result_count = response.hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Typesense search complete"
        );
        Ok(response)
    }

    #[instrument(skip(self), fields(subsystem = "backends", component = "typesense"))]
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let url = self.endpoint(&["collections"])?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("Typesense request failed: {}", e)))?;

        let collections: Vec<CollectionInfo> = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Failed to decode collection list: {}", e)))?;

        debug!(result_count = collections.len(), "Listed Typesense collections");
        Ok(collections)
    }
}
