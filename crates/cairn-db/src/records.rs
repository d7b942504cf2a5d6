//! Record repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cairn_core::{
    Analytics, Error, NewRecord, Record, RecordKind, RecordRepository, Result, TagCount,
};

/// PostgreSQL implementation of RecordRepository.
#[derive(Clone)]
pub struct PgRecordRepository {
    pool: Pool<Postgres>,
}

impl PgRecordRepository {
    /// Create a new PgRecordRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to a Record.
fn map_row(row: sqlx::postgres::PgRow) -> Result<Record> {
    let kind: String = row.get("kind");
    Ok(Record {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        kind: kind.parse::<RecordKind>()?,
        title: row.get("title"),
        body: row.get("body"),
        external_url: row.get("external_url"),
        tags: row.get("tags"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const RECORD_COLUMNS: &str =
    "id, owner_id, kind, title, body, external_url, tags, created_at, updated_at";

#[async_trait]
impl RecordRepository for PgRecordRepository {
    async fn insert(&self, owner_id: Uuid, record: NewRecord) -> Result<Record> {
        record.validate()?;
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            "INSERT INTO records (id, owner_id, kind, title, body, external_url, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            RECORD_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(record.kind().to_string())
        .bind(record.title())
        .bind(record.body())
        .bind(record.external_url())
        .bind(record.tags())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        map_row(row)
    }

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Record> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM records WHERE id = $1 AND owner_id = $2",
            RECORD_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::RecordNotFound(id))?;

        map_row(row)
    }

    async fn fetch_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {} FROM records WHERE owner_id = $1 AND id = ANY($2)",
            RECORD_COLUMNS
        ))
        .bind(owner_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(map_row).collect()
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Record>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM records WHERE owner_id = $1 ORDER BY created_at DESC",
            RECORD_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(map_row).collect()
    }

    async fn update(&self, owner_id: Uuid, record: &Record) -> Result<Record> {
        record.validate()?;
        let row = sqlx::query(&format!(
            "UPDATE records
             SET title = $3, body = $4, external_url = $5, tags = $6, updated_at = now()
             WHERE id = $1 AND owner_id = $2
             RETURNING {}",
            RECORD_COLUMNS
        ))
        .bind(record.id)
        .bind(owner_id)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.external_url)
        .bind(&record.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::RecordNotFound(record.id))?;

        map_row(row)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound(id));
        }
        Ok(())
    }

    async fn analytics(&self, owner_id: Uuid) -> Result<Analytics> {
        let kind_rows = sqlx::query(
            "SELECT kind, COUNT(*) AS count FROM records WHERE owner_id = $1 GROUP BY kind",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_kind: HashMap<String, i64> = HashMap::new();
        let mut total: i64 = 0;
        for row in kind_rows {
            let kind: String = row.get("kind");
            let count: i64 = row.get("count");
            total += count;
            by_kind.insert(kind, count);
        }

        let tag_rows = sqlx::query(
            "SELECT tag, COUNT(*) AS count
             FROM records, unnest(tags) AS tag
             WHERE owner_id = $1
             GROUP BY tag
             ORDER BY count DESC, tag ASC
             LIMIT 5",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let top_tags = tag_rows
            .into_iter()
            .map(|row| TagCount {
                tag: row.get("tag"),
                count: row.get("count"),
            })
            .collect();

        Ok(Analytics {
            total,
            by_kind,
            top_tags,
        })
    }
}
