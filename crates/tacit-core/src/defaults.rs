//! Centralized default constants for the search adapter.
//!
//! **This module is the single source of truth** for shared default values.
//! Backends, the pipeline, and the tool server reference these constants
//! instead of defining their own magic numbers.

// =============================================================================
// COLLECTIONS
// =============================================================================

/// Candidate profile collection on the Primary backend.
pub const CANDIDATES_COLLECTION: &str = "candidates_candidates";

/// Candidate attachment collection on the Primary backend.
pub const ATTACHMENTS_COLLECTION: &str = "candidates_candidate-attachments";

// =============================================================================
// PAGINATION
// =============================================================================

/// Page used when the caller omits one or sends a value below 1.
pub const PAGE: u32 = 1;

/// Page size used when the caller omits one or sends a value below 1.
pub const PER_PAGE: u32 = 10;

/// Page size cap for candidate and generic collection searches.
pub const PER_PAGE_MAX: u32 = 100;

/// Page size cap for attachment searches.
pub const ATTACHMENT_PER_PAGE_MAX: u32 = 50;

// =============================================================================
// QUERY DEFAULTS
// =============================================================================

/// Fields searched in the candidate collection when the caller names none.
pub const CANDIDATE_SEARCH_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "skills",
    "latest_experience",
    "highest_education",
    "description",
];

/// Fields searched in the attachment collection when the caller names none.
pub const ATTACHMENT_SEARCH_FIELDS: &[&str] = &["name", "content"];

/// Embedding field appended to the query-by list for semantic search.
pub const EMBEDDING_FIELD: &str = "embedding";

/// Wildcard query used when the text query is carried elsewhere (vector search).
pub const MATCH_ALL_QUERY: &str = "*";

// =============================================================================
// PRIMARY BACKEND (Typesense)
// =============================================================================

pub const TYPESENSE_HOST: &str = "localhost";
pub const TYPESENSE_PORT: u16 = 8108;
pub const TYPESENSE_PROTOCOL: &str = "http";

/// Placeholder key matching a local development server.
pub const TYPESENSE_API_KEY: &str = "xyz";

// =============================================================================
// SECONDARY BACKEND (remote REST API)
// =============================================================================

pub const TACITBASE_BASE_URL: &str = "https://staging.local.tacitbase.com/v1";

/// Path appended to the base URL for candidate searches.
pub const TACITBASE_SEARCH_PATH: &str = "/search/documents/find/candidates";

/// Environment variable holding the Secondary's bearer credential.
pub const TACITBASE_AUTH_TOKEN_VAR: &str = "TACITBASE_AUTH_TOKEN";

// =============================================================================
// TRANSPORT
// =============================================================================

/// Outbound request timeout in seconds for either backend.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// FORMATTING
// =============================================================================

/// Characters of attachment content shown in a preview.
pub const CONTENT_PREVIEW_CHARS: usize = 200;
