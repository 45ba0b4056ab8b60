//! Named operations exposed at the tool boundary.

use std::fmt;
use std::str::FromStr;

use tacit_core::defaults::{ATTACHMENT_PER_PAGE_MAX, PER_PAGE_MAX};
use tacit_core::Error;

use crate::dispatch::{FallbackPolicy, Route};

/// Every operation the adapter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SearchCandidates,
    SearchAttachments,
    StagingSearchCandidates,
    VectorSearchCandidates,
    SemanticSearchCandidates,
    SearchCollection,
    ListCollections,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::SearchCandidates,
        Operation::SearchAttachments,
        Operation::StagingSearchCandidates,
        Operation::VectorSearchCandidates,
        Operation::SemanticSearchCandidates,
        Operation::SearchCollection,
        Operation::ListCollections,
    ];

    /// Tool name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchCandidates => "search_candidates",
            Self::SearchAttachments => "search_attachments",
            Self::StagingSearchCandidates => "staging_search_candidates",
            Self::VectorSearchCandidates => "vector_search_candidates",
            Self::SemanticSearchCandidates => "semantic_search_candidates",
            Self::SearchCollection => "search_collection",
            Self::ListCollections => "list_collections",
        }
    }

    /// Upper bound for `per_page`.
    pub fn per_page_cap(&self) -> u32 {
        match self {
            Self::SearchAttachments => ATTACHMENT_PER_PAGE_MAX,
            _ => PER_PAGE_MAX,
        }
    }

    /// Backend route under the given fallback policy.
    ///
    /// Keyword and semantic candidate search may fall back. Semantic search
    /// carries `embedding_model`, which only the Secondary understands.
    pub fn route(&self, policy: FallbackPolicy) -> Route {
        match self {
            Self::SearchCandidates | Self::SemanticSearchCandidates if policy.is_enabled() => {
                Route::PrimaryWithFallback
            }
            Self::StagingSearchCandidates => Route::Secondary,
            _ => Route::Primary,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::Decode(format!("unknown operation: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert!("drop_collection".parse::<Operation>().is_err());
    }

    #[test]
    fn test_attachment_cap_is_lower() {
        assert_eq!(Operation::SearchAttachments.per_page_cap(), 50);
        assert_eq!(Operation::SearchCandidates.per_page_cap(), 100);
    }

    #[test]
    fn test_routes() {
        assert_eq!(
            Operation::SearchCandidates.route(FallbackPolicy::Enabled),
            Route::PrimaryWithFallback
        );
        assert_eq!(
            Operation::SearchCandidates.route(FallbackPolicy::Disabled),
            Route::Primary
        );
        assert_eq!(
            Operation::SemanticSearchCandidates.route(FallbackPolicy::Enabled),
            Route::PrimaryWithFallback
        );
        assert_eq!(
            Operation::SemanticSearchCandidates.route(FallbackPolicy::Disabled),
            Route::Primary
        );
        assert_eq!(
            Operation::StagingSearchCandidates.route(FallbackPolicy::Enabled),
            Route::Secondary
        );
        for op in [
            Operation::SearchAttachments,
            Operation::VectorSearchCandidates,
            Operation::SearchCollection,
        ] {
            assert_eq!(op.route(FallbackPolicy::Enabled), Route::Primary);
        }
    }
}
