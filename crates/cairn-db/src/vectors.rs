//! Vector index implementation over pgvector.
//!
//! The index is a derived artifact keyed by record id: refreshed when a
//! record's embedded fields change, deleted with the record, and always
//! rebuildable from the primary store. Writes here are not transactional
//! with `records` writes; callers treat sync as best effort.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use cairn_core::{Candidate, Error, Result, Vector, VectorIndex, VectorMetadata};

/// PostgreSQL/pgvector implementation of VectorIndex.
#[derive(Clone)]
pub struct PgVectorIndex {
    pool: Pool<Postgres>,
    dimension: usize,
}

impl PgVectorIndex {
    /// Create a new PgVectorIndex enforcing the given dimension.
    pub fn new(pool: Pool<Postgres>, dimension: usize) -> Self {
        Self { pool, dimension }
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, record_id: Uuid, vector: &Vector, meta: &VectorMetadata) -> Result<()> {
        // Hard error before the write: a wrong-length vector would silently
        // corrupt the index.
        if vector.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "dimension mismatch: got {}, expected {}",
                vector.len(),
                self.dimension
            )));
        }

        sqlx::query(
            "INSERT INTO record_vectors (record_id, owner_id, kind, title, vector, updated_at)
             VALUES ($1, $2, $3, $4, $5, now())
             ON CONFLICT (record_id) DO UPDATE
             SET owner_id = EXCLUDED.owner_id,
                 kind = EXCLUDED.kind,
                 title = EXCLUDED.title,
                 vector = EXCLUDED.vector,
                 updated_at = now()",
        )
        .bind(record_id)
        .bind(meta.owner_id)
        .bind(meta.kind.to_string())
        .bind(&meta.title)
        .bind(pgvector::Vector::from(vector.clone()))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "index",
            component = "vector_index",
            op = "upsert",
            record_id = %record_id,
            dimension = vector.len(),
            "Upserted vector entry"
        );
        Ok(())
    }

    async fn query(&self, owner_id: Uuid, vector: &Vector, top_k: usize) -> Result<Vec<Candidate>> {
        if vector.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "dimension mismatch: got {}, expected {}",
                vector.len(),
                self.dimension
            )));
        }

        let rows = sqlx::query(
            "SELECT record_id, 1.0 - (vector <=> $1::vector) AS score
             FROM record_vectors
             WHERE owner_id = $2
             ORDER BY vector <=> $1::vector
             LIMIT $3",
        )
        .bind(pgvector::Vector::from(vector.clone()))
        .bind(owner_id)
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let candidates = rows
            .into_iter()
            .enumerate()
            .map(|(rank, row)| Candidate {
                record_ref: row.get("record_id"),
                rank,
                score: row.get::<f64, _>("score") as f32,
            })
            .collect();

        Ok(candidates)
    }

    async fn delete(&self, record_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM record_vectors WHERE record_id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
