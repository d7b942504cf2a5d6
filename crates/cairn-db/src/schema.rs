//! Bootstrap schema for the cairn database.
//!
//! Idempotent DDL applied at startup. The vector column dimension is fixed
//! per deployment; changing it requires dropping `record_vectors` and
//! re-embedding, which is safe because the index is derived from `records`.

use sqlx::PgPool;
use tracing::info;

use cairn_core::{Error, Result};

/// Apply the bootstrap schema. Safe to run on every startup.
pub async fn bootstrap(pool: &PgPool, dimension: usize) -> Result<()> {
    info!(
        subsystem = "db",
        component = "schema",
        op = "bootstrap",
        dimension = dimension,
        "Applying bootstrap schema"
    );

    for statement in statements(dimension) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    Ok(())
}

fn statements(dimension: usize) -> Vec<String> {
    vec![
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id UUID PRIMARY KEY,
            owner_id UUID NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('text', 'document', 'bookmark')),
            title TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            external_url TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#
        .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_records_owner_created
         ON records (owner_id, created_at DESC)"
            .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS record_vectors (
                record_id UUID PRIMARY KEY,
                owner_id UUID NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                vector vector({}) NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            dimension
        ),
        "CREATE INDEX IF NOT EXISTS idx_record_vectors_owner
         ON record_vectors (owner_id)"
            .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS api_keys (
            id UUID PRIMARY KEY,
            owner_id UUID NOT NULL,
            token_hash TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#
        .to_string(),
    ]
}
