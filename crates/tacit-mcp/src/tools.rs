//! Tool registry: one MCP tool per search operation.

use serde_json::{json, Map, Value as JsonValue};

use tacit_search::Operation;

use crate::protocol::Tool;

fn pagination(properties: &mut Map<String, JsonValue>, max_per_page: u32) {
    properties.insert(
        "page".into(),
        json!({
            "type": "number",
            "description": "Page number for pagination (1-based)"
        }),
    );
    properties.insert(
        "per_page".into(),
        json!({
            "type": "number",
            "description": format!("Number of results per page (default: 10, max: {})", max_per_page)
        }),
    );
}

fn field_lists(properties: &mut Map<String, JsonValue>, fields_hint: &str) {
    properties.insert(
        "query_by".into(),
        json!({
            "type": "string",
            "description": format!("Comma-separated fields to search in. {}", fields_hint)
        }),
    );
    properties.insert(
        "filter_by".into(),
        json!({
            "type": "string",
            "description": "Comma-separated filter expressions in format field:value, combined with AND. Example: location:Berlin, years_of_experience:>5"
        }),
    );
    properties.insert(
        "sort_by".into(),
        json!({
            "type": "string",
            "description": "Comma-separated sort expressions. Example: created_at:desc"
        }),
    );
}

fn query(description: &str) -> JsonValue {
    json!({"type": "string", "description": description})
}

const CANDIDATE_FIELDS_HINT: &str = "Available fields: first_name, last_name, email, phone, skills, latest_experience, highest_education, description. Defaults to the name, contact and profile fields.";

fn schema(properties: Map<String, JsonValue>, required: &[&str]) -> JsonValue {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn input_schema(op: Operation) -> JsonValue {
    let mut props = Map::new();

    match op {
        Operation::SearchCandidates | Operation::StagingSearchCandidates => {
            props.insert(
                "q".into(),
                query("Search query to find candidates. Can be keywords, phrases, or natural language queries."),
            );
            field_lists(&mut props, CANDIDATE_FIELDS_HINT);
            props.insert(
                "group_by".into(),
                json!({"type": "string", "description": "Comma-separated fields to group results by"}),
            );
            pagination(&mut props, op.per_page_cap());
            schema(props, &["q"])
        }
        Operation::SearchAttachments => {
            props.insert(
                "q".into(),
                query("Search query to find attachments. Can search in file names and content."),
            );
            field_lists(
                &mut props,
                "Available fields: name, content. Defaults to name and content.",
            );
            props.insert(
                "record_id".into(),
                json!({"type": "string", "description": "Restrict results to attachments of this candidate record"}),
            );
            pagination(&mut props, op.per_page_cap());
            schema(props, &["q"])
        }
        Operation::VectorSearchCandidates => {
            props.insert(
                "vector_query".into(),
                json!({
                    "type": "string",
                    "description": "Typesense vector query expression. Example: embedding:([0.12, 0.45, ...], k:10)"
                }),
            );
            field_lists(&mut props, CANDIDATE_FIELDS_HINT);
            pagination(&mut props, op.per_page_cap());
            schema(props, &["vector_query"])
        }
        Operation::SemanticSearchCandidates => {
            props.insert(
                "q".into(),
                query("Natural language description of the candidates to find"),
            );
            field_lists(&mut props, CANDIDATE_FIELDS_HINT);
            props.insert(
                "embedding_field".into(),
                json!({"type": "string", "description": "Embedding field to search (default: embedding)"}),
            );
            props.insert(
                "embedding_model".into(),
                json!({"type": "string", "description": "Embedding model name. Sent to the Tacitbase API when the search falls back to it"}),
            );
            pagination(&mut props, op.per_page_cap());
            schema(props, &["q"])
        }
        Operation::SearchCollection => {
            props.insert(
                "collection".into(),
                json!({
                    "type": "string",
                    "description": "Collection to search: candidates_candidates or candidates_candidate-attachments"
                }),
            );
            props.insert("q".into(), query("Search query. Use * to match all documents."));
            field_lists(&mut props, "Defaults depend on the collection.");
            props.insert(
                "group_by".into(),
                json!({"type": "string", "description": "Comma-separated fields to group results by"}),
            );
            props.insert(
                "facet_by".into(),
                json!({"type": "string", "description": "Comma-separated fields to compute facet counts for"}),
            );
            props.insert(
                "format".into(),
                json!({
                    "type": "string",
                    "enum": ["entities", "documents"],
                    "description": "entities = candidate and attachment cards, documents = raw documents with highlights and facets. Default: entities"
                }),
            );
            pagination(&mut props, op.per_page_cap());
            schema(props, &["collection", "q"])
        }
        Operation::ListCollections => schema(props, &[]),
    }
}

fn description(op: Operation) -> &'static str {
    match op {
        Operation::SearchCandidates => "Search for candidates in Tacitbase using Typesense's search capabilities. Falls back to the Tacitbase API when Typesense is unavailable.",
        Operation::SearchAttachments => "Search candidate attachments (resumes, portfolios, etc.) in the candidates_candidate-attachments collection, optionally for a single candidate.",
        Operation::StagingSearchCandidates => "Search for candidates directly in the Tacitbase staging environment",
        Operation::VectorSearchCandidates => "Find candidates nearest to a vector query using Typesense vector search",
        Operation::SemanticSearchCandidates => "Hybrid keyword and embedding search for candidates. Falls back to the Tacitbase API when Typesense is unavailable.",
        Operation::SearchCollection => "Search any searchable collection and show candidates and attachments, or raw documents with highlights and facets",
        Operation::ListCollections => "List the searchable collections with their document counts",
    }
}

/// Definitions for every operation, in registration order.
pub fn tool_definitions() -> Vec<Tool> {
    Operation::ALL
        .iter()
        .map(|op| Tool {
            name: op.name().to_string(),
            description: description(*op).to_string(),
            input_schema: input_schema(*op),
        })
        .collect()
}
