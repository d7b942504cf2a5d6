//! Core traits for cairn abstractions.
//!
//! These traits define the seams between the request handlers and the
//! external collaborators: the primary record store, the derived vector
//! index, the embedding and generation providers, and file storage.

use async_trait::async_trait;
use uuid::Uuid;

use crate::defaults;
use crate::error::Result;
use crate::models::{Analytics, Candidate, NewRecord, Record, RecordKind};

/// Embedding vector. Dimensionality is fixed per deployment and enforced at
/// the index boundary before any write.
pub type Vector = Vec<f32>;

// =============================================================================
// RECORD REPOSITORY
// =============================================================================

/// Primary store for records. Every operation is scoped to an owner; a
/// record that exists under another owner behaves as not found.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert a new record and return the stored row.
    async fn insert(&self, owner_id: Uuid, record: NewRecord) -> Result<Record>;

    /// Fetch a record by id.
    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Record>;

    /// Bulk fetch by id list. Missing ids are omitted; order is unspecified.
    async fn fetch_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<Record>>;

    /// List all records for an owner, newest first.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Record>>;

    /// Persist an updated record (kind immutable) and bump `updated_at`.
    async fn update(&self, owner_id: Uuid, record: &Record) -> Result<Record>;

    /// Delete a record.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()>;

    /// Aggregate counts by kind and top tags for an owner.
    async fn analytics(&self, owner_id: Uuid) -> Result<Analytics>;
}

// =============================================================================
// VECTOR INDEX
// =============================================================================

/// Metadata stored alongside a vector entry.
#[derive(Debug, Clone)]
pub struct VectorMetadata {
    pub owner_id: Uuid,
    pub kind: RecordKind,
    pub title: String,
}

/// Derived vector index keyed by record id.
///
/// Entries are a secondary representation of records: refreshed whenever the
/// embedded fields change, removed with the record, rebuildable from the
/// primary store. Sync with the primary store is best effort, not
/// transactional.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The configured vector dimension. Implementations must reject vectors
    /// of any other length before writing.
    fn dimension(&self) -> usize;

    /// Insert or replace the entry for a record.
    async fn upsert(&self, record_id: Uuid, vector: &Vector, meta: &VectorMetadata) -> Result<()>;

    /// Top-k similarity search over one owner's entries, ranked best first.
    async fn query(&self, owner_id: Uuid, vector: &Vector, top_k: usize) -> Result<Vec<Candidate>>;

    /// Remove the entry for a record, if present.
    async fn delete(&self, record_id: Uuid) -> Result<()>;
}

// =============================================================================
// INFERENCE BACKENDS
// =============================================================================

/// Whether a text is being embedded for storage or as a search query.
/// Asymmetric embedding models treat the two differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedInputType {
    Document,
    Query,
}

impl EmbedInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => defaults::EMBED_INPUT_DOCUMENT,
            Self::Query => defaults::EMBED_INPUT_QUERY,
        }
    }
}

/// Backend producing fixed-dimensionality embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str, input_type: EmbedInputType) -> Result<Vector>;

    /// Expected dimension of returned vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Options for a generation call.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: defaults::ANSWER_MAX_TOKENS,
            temperature: defaults::GEN_TEMPERATURE,
            stop_sequences: vec![defaults::GEN_STOP_SEQUENCE.to_string()],
        }
    }
}

impl GenerationOptions {
    /// Default options with a different token budget.
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// A stored file, addressable by a durable URL.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Durable, retrievable URL (or server-relative path) for the file.
    pub url: String,
    pub size_bytes: usize,
}

/// Blob storage for uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store a raw byte stream, returning a durable URL.
    async fn store(&self, filename: &str, data: &[u8]) -> Result<StoredFile>;

    /// Delete a stored file by its URL. Missing files are not an error.
    async fn delete(&self, url: &str) -> Result<()>;
}

// =============================================================================
// API KEYS
// =============================================================================

/// Lookup from a hashed bearer token to the owning user.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Resolve a SHA-256 token hash (lowercase hex) to an owner id.
    async fn resolve_owner(&self, token_hash: &str) -> Result<Option<Uuid>>;
}
