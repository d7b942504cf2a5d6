//! Structured logging field name constants for cairn.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, best-effort step failed |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (index hits, blocks) |

/// Correlation ID propagated across a request and its external calls.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "index", "inference", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "cohere", "pool", "vector_index", "assembler"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "embed", "generate", "upsert_vector"
pub const OPERATION: &str = "op";

/// Record UUID being operated on.
pub const RECORD_ID: &str = "record_id";

/// Owner UUID scoping the operation.
pub const OWNER_ID: &str = "owner_id";

/// Search query text.
pub const QUERY: &str = "query";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of candidates admitted to the assembled context.
pub const INCLUDED_COUNT: &str = "included_count";

/// Character count of the assembled context.
pub const CONTEXT_CHARS: &str = "context_chars";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Embedding dimension involved in the operation.
pub const DIMENSION: &str = "dimension";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
