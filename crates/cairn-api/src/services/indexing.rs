//! Vector-index synchronization.
//!
//! The index holds derived data. Writes are sequential with the primary
//! store, not transactional: a record can briefly exist without a fresh
//! vector entry, and removal after delete is best effort.

use tracing::warn;
use uuid::Uuid;

use cairn_core::{EmbedInputType, EmbeddingBackend, Record, Result, VectorIndex, VectorMetadata};

/// Embed a record and upsert its index entry. Called after create and after
/// any update that touches an embedded field.
pub async fn index_record(
    embeddings: &dyn EmbeddingBackend,
    index: &dyn VectorIndex,
    record: &Record,
) -> Result<()> {
    let vector = embeddings
        .embed(&record.embedding_text(), EmbedInputType::Document)
        .await?;
    let meta = VectorMetadata {
        owner_id: record.owner_id,
        kind: record.kind,
        title: record.title.clone(),
    };
    index.upsert(record.id, &vector, &meta).await
}

/// Remove a record's index entry after the record itself is gone. A failure
/// here leaves a stale entry that candidate resolution drops at query time,
/// so the request still succeeds.
pub async fn deindex_record(index: &dyn VectorIndex, record_id: Uuid) {
    if let Err(err) = index.delete(record_id).await {
        warn!(
            subsystem = "api",
            component = "indexing",
            record_id = %record_id,
            error_msg = %err,
            "Failed to remove vector entry; index is stale until rebuilt"
        );
    }
}
