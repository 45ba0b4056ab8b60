//! Query building.
//!
//! Maps typed request records onto the backend-neutral [`SearchQuery`] and
//! renders that query into each backend's wire shape. Everything here is
//! pure and deterministic.

use serde::Serialize;

use tacit_core::defaults::{
    ATTACHMENTS_COLLECTION, ATTACHMENT_SEARCH_FIELDS, CANDIDATES_COLLECTION,
    CANDIDATE_SEARCH_FIELDS, MATCH_ALL_QUERY,
};
use tacit_core::{
    collection_kind, AttachmentSearchRequest, CollectionKind, SearchQuery, SearchRequest,
    SemanticSearchRequest, VectorSearchRequest,
};

/// Separator for field lists (`query_by`, `sort_by`, `group_by`, `facet_by`).
pub const FIELD_SEPARATOR: &str = ",";

/// Separator for conjunctive filter expressions.
pub const FILTER_SEPARATOR: &str = " && ";

/// Default fields searched for a collection when the caller names none.
///
/// Unknown collections get no default; they never pass the allow-list.
pub fn default_search_fields(collection: &str) -> Vec<String> {
    let fields: &[&str] = match collection_kind(collection) {
        CollectionKind::Candidates => CANDIDATE_SEARCH_FIELDS,
        CollectionKind::Attachments => ATTACHMENT_SEARCH_FIELDS,
        CollectionKind::Other => &[],
    };
    fields.iter().map(|f| f.to_string()).collect()
}

fn fields_or_default(fields: &[String], collection: &str) -> Vec<String> {
    if fields.is_empty() {
        default_search_fields(collection)
    } else {
        fields.to_vec()
    }
}

/// Exact-match filter restricting attachments to one owning record.
pub fn record_filter(record_id: &str) -> String {
    format!("record_id:=`{}`", record_id.replace('`', ""))
}

/// Keyword search. The collection is taken from the request as-is.
pub fn build_search_query(req: &SearchRequest) -> SearchQuery {
    SearchQuery {
        collection: req.collection.clone(),
        q: req.query.clone(),
        query_by: fields_or_default(&req.search_fields, &req.collection),
        filter_by: req.filter_fields.clone(),
        sort_by: req.sort_by.clone(),
        group_by: req.group_by.clone(),
        facet_by: req.facet_by.clone(),
        vector_query: None,
        embedding_model: None,
        page: req.page,
        per_page: req.per_page,
    }
}

/// Attachment search. Always targets the attachment collection; a record
/// scope is appended to the caller's filters.
pub fn build_attachment_query(req: &AttachmentSearchRequest) -> SearchQuery {
    let mut filter_by = req.filter_fields.clone();
    if let Some(ref record_id) = req.record_id {
        filter_by.push(record_filter(record_id));
    }

    SearchQuery {
        collection: ATTACHMENTS_COLLECTION.to_string(),
        q: req.query.clone(),
        query_by: fields_or_default(&req.search_fields, ATTACHMENTS_COLLECTION),
        filter_by,
        sort_by: req.sort_by.clone(),
        page: req.page,
        per_page: req.per_page,
        ..Default::default()
    }
}

/// Vector search over candidates. The text query is the match-all wildcard.
pub fn build_vector_query(req: &VectorSearchRequest) -> SearchQuery {
    SearchQuery {
        collection: CANDIDATES_COLLECTION.to_string(),
        q: MATCH_ALL_QUERY.to_string(),
        query_by: fields_or_default(&req.search_fields, CANDIDATES_COLLECTION),
        filter_by: req.filter_fields.clone(),
        sort_by: req.sort_by.clone(),
        vector_query: Some(req.vector_query.clone()),
        page: req.page,
        per_page: req.per_page,
        ..Default::default()
    }
}

/// Hybrid keyword + embedding search over candidates.
pub fn build_semantic_query(req: &SemanticSearchRequest) -> SearchQuery {
    let mut query_by = fields_or_default(&req.search_fields, CANDIDATES_COLLECTION);
    if !query_by.iter().any(|f| f == &req.embedding_field) {
        query_by.push(req.embedding_field.clone());
    }

    SearchQuery {
        collection: CANDIDATES_COLLECTION.to_string(),
        q: req.query.clone(),
        query_by,
        filter_by: req.filter_fields.clone(),
        sort_by: req.sort_by.clone(),
        embedding_model: req.embedding_model.clone(),
        page: req.page,
        per_page: req.per_page,
        ..Default::default()
    }
}

// =============================================================================
// WIRE SHAPES
// =============================================================================

/// Primary (Typesense) search parameters, multi-value fields joined.
///
/// Empty strings are kept in the struct and skipped on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypesenseParams {
    pub q: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub facet_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_query: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl From<&SearchQuery> for TypesenseParams {
    fn from(query: &SearchQuery) -> Self {
        Self {
            q: query.q.clone(),
            query_by: query.query_by.join(FIELD_SEPARATOR),
            filter_by: query.filter_by.join(FILTER_SEPARATOR),
            sort_by: query.sort_by.join(FIELD_SEPARATOR),
            group_by: query.group_by.join(FIELD_SEPARATOR),
            facet_by: query.facet_by.join(FIELD_SEPARATOR),
            vector_query: query.vector_query.clone(),
            page: query.page,
            per_page: query.per_page,
        }
    }
}

/// Secondary (remote API) request body. Lists stay structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteSearchBody {
    pub collection: String,
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

impl From<&SearchQuery> for RemoteSearchBody {
    fn from(query: &SearchQuery) -> Self {
        Self {
            collection: query.collection.clone(),
            query: query.q.clone(),
            search_fields: query.query_by.clone(),
            filter_fields: query.filter_by.clone(),
            sort_by: query.sort_by.clone(),
            group_by: query.group_by.clone(),
            page: query.page,
            per_page: query.per_page,
            embedding_model: query.embedding_model.clone(),
        }
    }
}
