//! Secondary backend: the Tacitbase remote search API.
//!
//! Two incompatible response layouts are deployed. The paginated layout is
//! tried first, then the flat one; the layout that matched is logged.

use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, warn};

use tacit_core::{Document, Error, Hit, Result, SearchBackend, SearchQuery, SearchResponse};
use tacit_search::RemoteSearchBody;

use crate::config::RemoteConfig;

/// `{ "candidates": [...], "pagination": { "total", "page", "per_page" } }`
#[derive(Debug, Deserialize)]
struct PaginatedResponse {
    candidates: Vec<JsonValue>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

/// `{ "found", "page", "per_page", "hits": [...] }`
#[derive(Debug, Deserialize)]
struct FlatResponse {
    #[serde(default)]
    found: u64,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
    hits: Vec<JsonValue>,
}

/// Response layout that matched during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Paginated,
    Flat,
}

impl ResponseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paginated => "paginated",
            Self::Flat => "flat",
        }
    }
}

/// Wrap a raw entry as a hit. Entries already carrying a `document` object
/// keep their metadata; anything that is not an object becomes an empty
/// document so the normalizer counts it as dropped.
fn to_hit(entry: JsonValue) -> Hit {
    match entry {
        JsonValue::Object(map) if matches!(map.get("document"), Some(JsonValue::Object(_))) => {
            serde_json::from_value(JsonValue::Object(map.clone()))
                .unwrap_or_else(|_| Hit::plain(map))
        }
        JsonValue::Object(map) => Hit::plain(map),
        _ => Hit::plain(Document::new()),
    }
}

/// Decode a response body, trying the paginated layout before the flat one.
///
/// Absent pagination values fall back to the ones requested.
pub fn decode_response(body: &str, query: &SearchQuery) -> Result<(SearchResponse, ResponseShape)> {
    let paginated_err = match serde_json::from_str::<PaginatedResponse>(body) {
        Ok(p) => {
            let response = SearchResponse {
                found: p.pagination.total,
                page: p.pagination.page.unwrap_or(query.page),
                per_page: p.pagination.per_page.unwrap_or(query.per_page),
                hits: p.candidates.into_iter().map(to_hit).collect(),
                facet_counts: Vec::new(),
            };
            return Ok((response, ResponseShape::Paginated));
        }
        Err(e) => e,
    };

    match serde_json::from_str::<FlatResponse>(body) {
        Ok(f) => Ok((
            SearchResponse {
                found: f.found,
                page: f.page.unwrap_or(query.page),
                per_page: f.per_page.unwrap_or(query.per_page),
                hits: f.hits.into_iter().map(to_hit).collect(),
                facet_counts: Vec::new(),
            },
            ResponseShape::Flat,
        )),
        Err(flat_err) => Err(Error::Backend(format!(
            "Unrecognized Tacitbase response (paginated: {}; flat: {})",
            paginated_err, flat_err
        ))),
    }
}

/// Tacitbase remote search backend.
pub struct TacitbaseBackend {
    client: Client,
    config: RemoteConfig,
}

impl TacitbaseBackend {
    pub fn new(config: RemoteConfig, timeout: Duration) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "backends",
            component = "tacitbase",
            url = %config.search_url(),
            "Initializing Tacitbase backend"
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Read the credential from the environment.
    fn auth_token(&self) -> Result<String> {
        env::var(&self.config.auth_token_var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} environment variable is not set",
                    self.config.auth_token_var
                ))
            })
    }
}

#[async_trait]
impl SearchBackend for TacitbaseBackend {
    fn name(&self) -> &str {
        "tacitbase"
    }

    #[instrument(skip(self, query), fields(
        subsystem = "backends",
        component = "tacitbase",
        collection = %query.collection,
    ))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        // No request is built without a credential.
        let token = self.auth_token()?;

        let start = Instant::now();
        let body = RemoteSearchBody::from(query);

        let response = self
            .client
            .post(self.config.search_url())
            .header("Content-Type", "application/json")
            .header("Authorization", token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Backend(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            warn!(status = %status, "Tacitbase request failed");
            return Err(Error::Backend(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                text
            )));
        }

        let (response, shape) = decode_response(&text, query)?;
        debug!(
            response_shape = shape.as_str(),
            found = response.found,
            result_count = response.hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tacitbase search complete"
        );
        Ok(response)
    }
}
