//! API-key repository.
//!
//! Keys are stored as SHA-256 hashes; the plaintext token never touches the
//! database. Key issuance is an operational concern (rows are provisioned
//! directly); this repository only resolves tokens to owners.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cairn_core::{ApiKeyStore, Error, Result};

/// SHA-256 hash of a bearer token, lowercase hex.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// PostgreSQL implementation of ApiKeyStore.
#[derive(Clone)]
pub struct PgApiKeyRepository {
    pool: Pool<Postgres>,
}

impl PgApiKeyRepository {
    /// Create a new PgApiKeyRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Provision a key for an owner. Returns the key row id.
    pub async fn create(&self, owner_id: Uuid, token: &str, name: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO api_keys (id, owner_id, token_hash, name) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(hash_token(token))
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyRepository {
    async fn resolve_owner(&self, token_hash: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT owner_id FROM api_keys WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("owner_id")))
    }
}
