//! Parameter decoding for tool invocations.
//!
//! A tool call arrives as an untyped JSON object. Decoding happens in two
//! steps so that "absent" and "present but empty" stay distinguishable:
//!
//! 1. [`decode`] deserializes the object into a `*Params` struct where every
//!    field is optional. Type coercion happens here (comma-joined strings
//!    become field lists, numeric strings become integers) but no defaults
//!    are injected.
//! 2. `into_request` applies defaults and pagination clamping, producing the
//!    typed request record from [`crate::models`].

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::{
    AttachmentSearchRequest, SearchRequest, SemanticSearchRequest, VectorSearchRequest,
};

/// Decode an untyped parameter map into a params struct.
///
/// `what` names the target shape in the error message.
pub fn decode<T: DeserializeOwned>(params: &Map<String, JsonValue>, what: &str) -> Result<T> {
    serde_json::from_value(JsonValue::Object(params.clone()))
        .map_err(|e| Error::Decode(format!("failed to unmarshal {}: {}", what, e)))
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Page number after defaulting: absent or below 1 becomes 1.
pub fn resolve_page(page: Option<i64>) -> u32 {
    match page {
        Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
        _ => defaults::PAGE,
    }
}

/// Page size after defaulting and clamping to `cap`.
///
/// Absent, zero or negative values become the default page size; values
/// above `cap` become `cap`.
pub fn resolve_per_page(per_page: Option<i64>, cap: u32) -> u32 {
    match per_page {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX).min(cap),
        _ => defaults::PER_PAGE.min(cap),
    }
}

// =============================================================================
// FIELD LISTS
// =============================================================================

/// Split a comma-delimited string into trimmed, non-empty segments.
pub fn split_delimited(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered list of field names or expressions.
///
/// Accepts either a JSON array of strings, kept verbatim, or a single
/// comma-delimited string. Always serializes as an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldList(pub Vec<String>);

impl FieldList {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'de> Deserialize<'de> for FieldList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(StringListVisitor).map(FieldList)
    }
}

struct StringListVisitor;

impl<'de> Visitor<'de> for StringListVisitor {
    type Value = Vec<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a comma-separated string or a list of strings")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(split_delimited(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_seq<A: de::SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<String>()? {
            out.push(item);
        }
        Ok(out)
    }
}

/// Deserialize a string list that may be stored as an array, a delimited
/// string, or null.
pub fn de_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    deserializer.deserialize_any(StringListVisitor)
}

// =============================================================================
// SCALAR COERCION
// =============================================================================

struct LenientIntVisitor;

impl<'de> Visitor<'de> for LenientIntVisitor {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        if v.fract() == 0.0 && v.is_finite() {
            Ok(Some(v as i64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        v.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }
}

/// Deserialize an optional integer sent as a number, integral float, or
/// numeric string.
pub fn de_lenient_int<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    deserializer.deserialize_any(LenientIntVisitor)
}

struct LenientStringVisitor;

impl<'de> Visitor<'de> for LenientStringVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }
}

/// Deserialize an optional identifier that backends store as text or number.
pub fn de_lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    deserializer.deserialize_any(LenientStringVisitor)
}

// =============================================================================
// PARAMS
// =============================================================================

fn required(value: Option<String>, name: &str) -> Result<String> {
    value.ok_or_else(|| Error::Decode(format!("missing required parameter `{}`", name)))
}

fn list(value: Option<FieldList>) -> Vec<String> {
    value.map(FieldList::into_vec).unwrap_or_default()
}

/// Raw parameters for keyword searches (`search_candidates`,
/// `staging_search_candidates`, `search_collection`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, alias = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, alias = "query_by", skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<FieldList>,
    #[serde(default, alias = "filter_by", skip_serializing_if = "Option::is_none")]
    pub filter_fields: Option<FieldList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<FieldList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<FieldList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<FieldList>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<i64>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_page: Option<i64>,
    /// Presentation for `search_collection`: "entities" or "documents".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl SearchParams {
    /// Apply defaults. An absent collection becomes empty; the caller decides
    /// whether to fix it or guard it.
    pub fn into_request(self, per_page_cap: u32) -> Result<SearchRequest> {
        Ok(SearchRequest {
            collection: self.collection.unwrap_or_default(),
            query: required(self.query, "q")?,
            search_fields: list(self.search_fields),
            filter_fields: list(self.filter_fields),
            sort_by: list(self.sort_by),
            group_by: list(self.group_by),
            facet_by: list(self.facet_by),
            page: resolve_page(self.page),
            per_page: resolve_per_page(self.per_page, per_page_cap),
        })
    }
}

/// Raw parameters for `vector_search_candidates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_query: Option<String>,
    #[serde(default, alias = "query_by", skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<FieldList>,
    #[serde(default, alias = "filter_by", skip_serializing_if = "Option::is_none")]
    pub filter_fields: Option<FieldList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<FieldList>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<i64>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_page: Option<i64>,
}

impl VectorSearchParams {
    pub fn into_request(self, per_page_cap: u32) -> Result<VectorSearchRequest> {
        Ok(VectorSearchRequest {
            vector_query: required(self.vector_query, "vector_query")?,
            search_fields: list(self.search_fields),
            filter_fields: list(self.filter_fields),
            sort_by: list(self.sort_by),
            page: resolve_page(self.page),
            per_page: resolve_per_page(self.per_page, per_page_cap),
        })
    }
}

/// Raw parameters for `semantic_search_candidates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticSearchParams {
    #[serde(default, alias = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, alias = "query_by", skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<FieldList>,
    #[serde(default, alias = "filter_by", skip_serializing_if = "Option::is_none")]
    pub filter_fields: Option<FieldList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<FieldList>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<i64>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

impl SemanticSearchParams {
    pub fn into_request(self, per_page_cap: u32) -> Result<SemanticSearchRequest> {
        let embedding_field = self
            .embedding_field
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| defaults::EMBEDDING_FIELD.to_string());

        Ok(SemanticSearchRequest {
            query: required(self.query, "q")?,
            search_fields: list(self.search_fields),
            filter_fields: list(self.filter_fields),
            sort_by: list(self.sort_by),
            embedding_field,
            embedding_model: self.embedding_model.filter(|m| !m.trim().is_empty()),
            page: resolve_page(self.page),
            per_page: resolve_per_page(self.per_page, per_page_cap),
        })
    }
}

/// Raw parameters for `search_attachments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentSearchParams {
    #[serde(default, alias = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, alias = "query_by", skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<FieldList>,
    #[serde(default, alias = "filter_by", skip_serializing_if = "Option::is_none")]
    pub filter_fields: Option<FieldList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<FieldList>,
    #[serde(
        default,
        deserialize_with = "de_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<i64>,
    #[serde(
        default,
        deserialize_with = "de_lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_page: Option<i64>,
}

impl AttachmentSearchParams {
    pub fn into_request(self, per_page_cap: u32) -> Result<AttachmentSearchRequest> {
        Ok(AttachmentSearchRequest {
            query: required(self.query, "q")?,
            search_fields: list(self.search_fields),
            filter_fields: list(self.filter_fields),
            sort_by: list(self.sort_by),
            record_id: self.record_id.filter(|id| !id.trim().is_empty()),
            page: resolve_page(self.page),
            per_page: resolve_per_page(self.per_page, per_page_cap),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_comma_separated_string_becomes_ordered_list() {
        let params: SearchParams = decode(
            &object(json!({"q": "rust", "search_fields": "skills,first_name,"})),
            "search request",
        )
        .unwrap();
        assert_eq!(
            params.search_fields,
            Some(FieldList(vec!["skills".into(), "first_name".into()]))
        );
    }

    #[test]
    fn test_structured_list_is_kept_verbatim() {
        let params: SearchParams = decode(
            &object(json!({"q": "rust", "filter_by": ["skills:rust", "location:Berlin"]})),
            "search request",
        )
        .unwrap();
        assert_eq!(
            params.filter_fields.unwrap().into_vec(),
            vec!["skills:rust", "location:Berlin"]
        );
    }

    #[test]
    fn test_round_trip_preserves_present_fields() {
        let input = json!({
            "collection": "candidates_candidates",
            "query": "python",
            "search_fields": ["skills", "description"],
            "filter_fields": ["years:>5"],
            "sort_by": ["created_at:desc"],
            "group_by": ["location"],
            "page": 3,
            "per_page": 25
        });
        let params: SearchParams = decode(&object(input.clone()), "search request").unwrap();
        assert_eq!(serde_json::to_value(&params).unwrap(), input);
    }

    #[test]
    fn test_absent_and_empty_are_distinguished_before_defaults() {
        let absent: SearchParams =
            decode(&object(json!({"q": "x"})), "search request").unwrap();
        let empty: SearchParams =
            decode(&object(json!({"q": "x", "sort_by": ""})), "search request").unwrap();
        assert_eq!(absent.sort_by, None);
        assert_eq!(empty.sort_by, Some(FieldList(vec![])));
    }

    #[test]
    fn test_numeric_coercion() {
        let params: SearchParams = decode(
            &object(json!({"q": "x", "page": "2", "per_page": 20.0})),
            "search request",
        )
        .unwrap();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.per_page, Some(20));
    }

    #[test]
    fn test_non_numeric_page_is_decode_error() {
        let err = decode::<SearchParams>(
            &object(json!({"q": "x", "page": "first"})),
            "search request",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().contains("failed to unmarshal search request"));
    }

    #[test]
    fn test_fractional_per_page_is_decode_error() {
        let err = decode::<SearchParams>(
            &object(json!({"q": "x", "per_page": 2.5})),
            "search request",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_pagination_defaults_and_caps() {
        assert_eq!(resolve_page(None), 1);
        assert_eq!(resolve_page(Some(0)), 1);
        assert_eq!(resolve_page(Some(-4)), 1);
        assert_eq!(resolve_page(Some(7)), 7);

        assert_eq!(resolve_per_page(None, 100), 10);
        assert_eq!(resolve_per_page(Some(0), 100), 10);
        assert_eq!(resolve_per_page(Some(-1), 100), 10);
        assert_eq!(resolve_per_page(Some(500), 100), 100);
        assert_eq!(resolve_per_page(Some(75), 50), 50);
        assert_eq!(resolve_per_page(Some(42), 100), 42);
    }

    #[test]
    fn test_per_page_always_within_cap() {
        for cap in [defaults::PER_PAGE_MAX, defaults::ATTACHMENT_PER_PAGE_MAX] {
            for raw in [-100, -1, 0, 1, 9, 10, 49, 50, 51, 99, 100, 101, 10_000] {
                let resolved = resolve_per_page(Some(raw), cap);
                assert!((1..=cap).contains(&resolved), "{} -> {}", raw, resolved);
            }
        }
    }

    #[test]
    fn test_search_params_into_request_applies_defaults() {
        let params: SearchParams = decode(
            &object(json!({"query": "python", "page": 0, "per_page": 500})),
            "search request",
        )
        .unwrap();
        let req = params.into_request(defaults::PER_PAGE_MAX).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 100);
        assert!(req.filter_fields.is_empty());
        assert!(req.sort_by.is_empty());
        assert_eq!(req.collection, "");
    }

    #[test]
    fn test_missing_query_is_decode_error() {
        let params: SearchParams = decode(&object(json!({"page": 1})), "search request").unwrap();
        let err = params.into_request(defaults::PER_PAGE_MAX).unwrap_err();
        assert!(matches!(err, Error::Decode(msg) if msg.contains("`q`")));
    }

    #[test]
    fn test_semantic_defaults_embedding_field() {
        let params: SemanticSearchParams = decode(
            &object(json!({"q": "backend engineer", "embedding_model": ""})),
            "semantic search request",
        )
        .unwrap();
        let req = params.into_request(defaults::PER_PAGE_MAX).unwrap();
        assert_eq!(req.embedding_field, "embedding");
        assert_eq!(req.embedding_model, None);
    }

    #[test]
    fn test_attachment_params_numeric_record_id() {
        let params: AttachmentSearchParams = decode(
            &object(json!({"q": "resume", "record_id": 991, "per_page": 80})),
            "attachments search request",
        )
        .unwrap();
        let req = params
            .into_request(defaults::ATTACHMENT_PER_PAGE_MAX)
            .unwrap();
        assert_eq!(req.record_id.as_deref(), Some("991"));
        assert_eq!(req.per_page, 50);
    }

    #[test]
    fn test_vector_query_required() {
        let params: VectorSearchParams =
            decode(&object(json!({"per_page": 5})), "vector search request").unwrap();
        assert!(params.into_request(defaults::PER_PAGE_MAX).is_err());
    }
}
