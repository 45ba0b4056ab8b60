//! Request, query, response and presentation types.
//!
//! Request records are produced by [`crate::params`] after defaults are
//! applied, turned into a backend-neutral [`SearchQuery`] by the query
//! builder, and answered with a [`SearchResponse`] whose hits are generic
//! documents. [`Candidate`] and [`Attachment`] are the typed presentation
//! entities the normalizer reconstructs from those documents.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::params::{de_lenient_string, de_string_list};

// =============================================================================
// REQUEST RECORDS
// =============================================================================

/// Keyword search against a candidate or caller-selected collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub collection: String,
    pub query: String,
    pub search_fields: Vec<String>,
    pub filter_fields: Vec<String>,
    pub sort_by: Vec<String>,
    pub group_by: Vec<String>,
    pub facet_by: Vec<String>,
    pub page: u32,
    pub per_page: u32,
}

/// Nearest-neighbour search using a caller-supplied vector query expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorSearchRequest {
    pub vector_query: String,
    pub search_fields: Vec<String>,
    pub filter_fields: Vec<String>,
    pub sort_by: Vec<String>,
    pub page: u32,
    pub per_page: u32,
}

/// Hybrid keyword + embedding search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticSearchRequest {
    pub query: String,
    pub search_fields: Vec<String>,
    pub filter_fields: Vec<String>,
    pub sort_by: Vec<String>,
    pub embedding_field: String,
    pub embedding_model: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

/// Search over candidate attachments, optionally scoped to one owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSearchRequest {
    pub query: String,
    pub search_fields: Vec<String>,
    pub filter_fields: Vec<String>,
    pub sort_by: Vec<String>,
    pub record_id: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

// =============================================================================
// BACKEND-NEUTRAL QUERY
// =============================================================================

/// Logical query handed to a backend.
///
/// Multi-value fields stay as ordered lists here; each backend renders them
/// into its own wire syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub collection: String,
    pub q: String,
    pub query_by: Vec<String>,
    pub filter_by: Vec<String>,
    pub sort_by: Vec<String>,
    pub group_by: Vec<String>,
    pub facet_by: Vec<String>,
    pub vector_query: Option<String>,
    pub embedding_model: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// A generic backend document. No keys are guaranteed.
pub type Document = Map<String, JsonValue>;

/// One matched document plus optional relevance metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub document: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
}

impl Hit {
    /// Wrap a bare document with no relevance metadata.
    pub fn plain(document: Document) -> Self {
        Self {
            document,
            text_match: None,
            highlights: Vec::new(),
        }
    }
}

/// Highlighted span for one field of a hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<String>,
}

/// Facet value counts for one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCount {
    pub field_name: String,
    #[serde(default)]
    pub counts: Vec<FacetValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Uniform search response returned by every backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub found: u64,
    pub page: u32,
    pub per_page: u32,
    pub hits: Vec<Hit>,
    pub facet_counts: Vec<FacetCount>,
}

/// Collection metadata from the Primary backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(default)]
    pub num_documents: u64,
}

// =============================================================================
// PRESENTATION ENTITIES
// =============================================================================

/// Timestamp as stored by a backend, either text or epoch seconds.
///
/// Epoch values are rendered as RFC 3339 so both representations display alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Epoch(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Ok(Timestamp(s)),
            Repr::Epoch(secs) => Ok(Timestamp(
                DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| secs.to_string()),
            )),
        }
    }
}

impl Timestamp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Candidate profile. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    #[serde(deserialize_with = "de_lenient_string")]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub pronouns: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "de_lenient_string")]
    pub phone: Option<String>,
    pub location: Option<String>,
    /// Stored either as a list or a comma-delimited string.
    #[serde(deserialize_with = "de_string_list")]
    pub skills: Vec<String>,
    pub latest_experience: Option<String>,
    pub highest_education: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub stackoverflow: Option<String>,
    pub personal_blog: Option<String>,
    pub dribbble: Option<String>,
    pub behance: Option<String>,
    pub google_scholar: Option<String>,
    pub research_gate: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl Candidate {
    /// Whether the document carries any identity or contact field.
    pub fn is_recognizable(&self) -> bool {
        [&self.first_name, &self.last_name, &self.email, &self.phone]
            .iter()
            .any(|f| has_text(f))
    }

    /// Display name assembled from the non-blank name parts.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|p| p.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Social profile links in display order, blank entries removed.
    pub fn social_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("LinkedIn", &self.linkedin),
            ("GitHub", &self.github),
            ("Twitter", &self.twitter),
            ("Stack Overflow", &self.stackoverflow),
            ("Personal Blog", &self.personal_blog),
            ("Dribbble", &self.dribbble),
            ("Behance", &self.behance),
            ("Google Scholar", &self.google_scholar),
            ("ResearchGate", &self.research_gate),
        ]
        .into_iter()
        .filter_map(|(label, value)| non_blank(value).map(|v| (label, v)))
        .collect()
    }
}

/// Candidate attachment such as a resume or portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    #[serde(deserialize_with = "de_lenient_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub model_name: Option<String>,
    pub object_key: Option<String>,
    #[serde(deserialize_with = "de_lenient_string")]
    pub record_id: Option<String>,
    pub parent: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl Attachment {
    /// Whether the document carries any attachment-specific linkage field.
    pub fn is_recognizable(&self) -> bool {
        [&self.object_key, &self.record_id, &self.model_name]
            .iter()
            .any(|f| has_text(f))
    }
}

/// Trimmed value of an optional text field, `None` when blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn has_text(value: &Option<String>) -> bool {
    non_blank(value).is_some()
}
