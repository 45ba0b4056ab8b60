//! Structured logging conventions.
//!
//! Every event carries `subsystem` ("mcp", "search", "backends") and, inside
//! a subsystem, `component` ("service", "dispatcher", "typesense", ...).
//!
//! Span fields that are only known once a call has finished are declared
//! `tracing::field::Empty` when the span opens and filled in through
//! `Span::record` with the names below, so every completed operation reports
//! them under the same keys.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied, hits dropped |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (search hits) |

/// Backend that served the call ("primary", "secondary").
pub const BACKEND: &str = "backend";

/// Total matches reported by the backend.
pub const FOUND: &str = "found";

/// Entries rendered for the caller.
pub const RESULT_COUNT: &str = "result_count";

/// Hits dropped during normalization.
pub const DROPPED: &str = "dropped";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Fields recorded on an operation span after it completes.
pub const COMPLETION_FIELDS: [&str; 5] = [BACKEND, FOUND, RESULT_COUNT, DROPPED, DURATION_MS];
