//! # cairn-db
//!
//! PostgreSQL storage layer for cairn.
//!
//! This crate provides:
//! - Connection pool management
//! - The record repository (primary store, owner-scoped)
//! - The pgvector-backed vector index (derived, best-effort synced)
//! - API-key lookup for request authentication
//! - Filesystem blob storage for uploaded documents
//!
//! ## Example
//!
//! ```rust,ignore
//! use cairn_db::Database;
//! use cairn_core::{NewRecord, RecordRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/cairn").await?;
//!     db.migrate(1024).await?;
//!
//!     let record = db.records.insert(owner_id, NewRecord::Text {
//!         title: "Hello".into(),
//!         body: "world".into(),
//!         tags: vec![],
//!     }).await?;
//!
//!     println!("Created record: {}", record.id);
//!     Ok(())
//! }
//! ```

pub mod api_keys;
pub mod files;
pub mod pool;
pub mod records;
pub mod schema;
pub mod vectors;

// Re-export core types
pub use cairn_core::*;

pub use api_keys::{hash_token, PgApiKeyRepository};
pub use files::FilesystemStorage;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use records::PgRecordRepository;
pub use vectors::PgVectorIndex;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Record repository (primary store).
    pub records: PgRecordRepository,
    /// Vector index over record embeddings (derived).
    pub vectors: PgVectorIndex,
    /// API-key lookup for authentication.
    pub api_keys: PgApiKeyRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    ///
    /// `dimension` is the fixed embedding dimension enforced by the vector
    /// index.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, dimension: usize) -> Self {
        Self {
            records: PgRecordRepository::new(pool.clone()),
            vectors: PgVectorIndex::new(pool.clone(), dimension),
            api_keys: PgApiKeyRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration and the default embedding
    /// dimension.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool, cairn_core::defaults::EMBED_DIMENSION))
    }

    /// Apply the bootstrap schema (idempotent).
    pub async fn migrate(&self, dimension: usize) -> Result<()> {
        schema::bootstrap(&self.pool, dimension).await
    }
}
