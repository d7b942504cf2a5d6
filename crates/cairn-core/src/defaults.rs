//! Centralized default constants for cairn.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default Cohere embedding model.
pub const EMBED_MODEL: &str = "embed-english-v3.0";

/// Default embedding vector dimension for embed-english-v3.0.
pub const EMBED_DIMENSION: usize = 1024;

/// Input type sent when embedding stored records.
pub const EMBED_INPUT_DOCUMENT: &str = "search_document";

/// Input type sent when embedding search queries.
pub const EMBED_INPUT_QUERY: &str = "search_query";

// =============================================================================
// GENERATION
// =============================================================================

/// Default Cohere generation model.
pub const GEN_MODEL: &str = "command-r-plus";

/// Sampling temperature for answer and summary generation.
pub const GEN_TEMPERATURE: f32 = 0.3;

/// Stop sequence appended to every generation request.
pub const GEN_STOP_SEQUENCE: &str = "--END--";

/// Token budget for search answer generation.
pub const ANSWER_MAX_TOKENS: u32 = 150;

// =============================================================================
// CONTEXT ASSEMBLY
// =============================================================================

/// Maximum records admitted by the primary pass of the context assembler.
pub const CONTEXT_PRIMARY_SLOTS: usize = 2;

/// Character cap applied to document-kind bodies before inclusion.
pub const CONTEXT_EXCERPT_CHARS: usize = 1000;

/// Global character ceiling for the assembled context.
pub const CONTEXT_TOTAL_CHARS: usize = 3000;

/// Delimiter line emitted between context blocks.
pub const CONTEXT_DELIMITER: &str = "\n---\n";

// =============================================================================
// SEARCH
// =============================================================================

/// Default number of vector-index hits requested per search.
pub const SEARCH_TOP_K: usize = 5;

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Minimum composed-text length eligible for summarization.
pub const SUMMARY_MIN_CHARS: usize = 20;

/// Composed text is truncated to this many characters before summarization.
pub const SUMMARY_MAX_CHARS: usize = 3000;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default rate limit: max requests per minute (global).
pub const RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Default multipart upload cap in bytes (16 MiB).
pub const UPLOAD_LIMIT_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Default Cohere API base URL.
pub const COHERE_BASE_URL: &str = "https://api.cohere.ai";
