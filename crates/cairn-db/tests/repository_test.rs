//! Live-database integration tests.
//!
//! Requires a running PostgreSQL with the pgvector extension available.
//! Run with:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/cairn_test cargo test -p cairn-db -- --ignored
//! ```

use cairn_core::{
    defaults, NewRecord, RecordKind, RecordRepository, RecordUpdate, VectorIndex, VectorMetadata,
};
use cairn_db::Database;
use uuid::Uuid;

async fn test_db() -> Database {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let db = Database::connect(&url).await.expect("connect");
    db.migrate(defaults::EMBED_DIMENSION).await.expect("migrate");
    db
}

fn unit_vector(seed: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; defaults::EMBED_DIMENSION];
    v[0] = seed;
    v[1] = 1.0 - seed;
    v
}

#[tokio::test]
#[ignore]
async fn test_record_crud_is_owner_scoped() {
    let db = test_db().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let record = db
        .records
        .insert(
            owner,
            NewRecord::Text {
                title: "Integration".to_string(),
                body: "crud body".to_string(),
                tags: vec!["it".to_string()],
            },
        )
        .await
        .expect("insert");
    assert_eq!(record.kind, RecordKind::Text);

    // Visible to the owner, invisible to anyone else.
    assert!(db.records.fetch(owner, record.id).await.is_ok());
    assert!(db.records.fetch(stranger, record.id).await.is_err());

    let mut updated = record.clone();
    updated.apply(RecordUpdate {
        title: Some("Renamed".to_string()),
        ..Default::default()
    });
    let stored = db.records.update(owner, &updated).await.expect("update");
    assert_eq!(stored.title, "Renamed");
    assert!(stored.updated_at >= record.updated_at);

    db.records.delete(owner, record.id).await.expect("delete");
    assert!(db.records.fetch(owner, record.id).await.is_err());
}

#[tokio::test]
#[ignore]
async fn test_vector_upsert_query_delete() {
    let db = test_db().await;
    let owner = Uuid::new_v4();

    let a = db
        .records
        .insert(
            owner,
            NewRecord::Text {
                title: "close".to_string(),
                body: "x".to_string(),
                tags: vec![],
            },
        )
        .await
        .unwrap();
    let b = db
        .records
        .insert(
            owner,
            NewRecord::Text {
                title: "far".to_string(),
                body: "y".to_string(),
                tags: vec![],
            },
        )
        .await
        .unwrap();

    for (rec, seed) in [(&a, 0.9), (&b, 0.1)] {
        db.vectors
            .upsert(
                rec.id,
                &unit_vector(seed),
                &VectorMetadata {
                    owner_id: owner,
                    kind: rec.kind,
                    title: rec.title.clone(),
                },
            )
            .await
            .expect("upsert");
    }

    let hits = db
        .vectors
        .query(owner, &unit_vector(0.9), 5)
        .await
        .expect("query");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].record_ref, a.id);
    assert_eq!(hits[0].rank, 0);

    db.vectors.delete(a.id).await.expect("delete");
    let hits = db.vectors.query(owner, &unit_vector(0.9), 5).await.unwrap();
    assert_eq!(hits.len(), 1);

    // Cleanup.
    db.vectors.delete(b.id).await.unwrap();
    db.records.delete(owner, a.id).await.unwrap();
    db.records.delete(owner, b.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_vector_dimension_mismatch_is_rejected() {
    let db = test_db().await;
    let owner = Uuid::new_v4();
    let err = db
        .vectors
        .upsert(
            Uuid::new_v4(),
            &vec![0.5f32; 7],
            &VectorMetadata {
                owner_id: owner,
                kind: RecordKind::Text,
                title: "bad".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("dimension mismatch"));
}

#[tokio::test]
#[ignore]
async fn test_analytics_counts_and_top_tags() {
    let db = test_db().await;
    let owner = Uuid::new_v4();

    for i in 0..3 {
        db.records
            .insert(
                owner,
                NewRecord::Text {
                    title: format!("n{}", i),
                    body: "b".to_string(),
                    tags: vec!["rust".to_string(), format!("misc{}", i)],
                },
            )
            .await
            .unwrap();
    }
    db.records
        .insert(
            owner,
            NewRecord::Bookmark {
                title: "link".to_string(),
                url: "http://example.com".to_string(),
                description: String::new(),
                tags: vec!["rust".to_string()],
            },
        )
        .await
        .unwrap();

    let analytics = db.records.analytics(owner).await.expect("analytics");
    assert_eq!(analytics.total, 4);
    assert_eq!(analytics.by_kind.get("text"), Some(&3));
    assert_eq!(analytics.by_kind.get("bookmark"), Some(&1));
    assert_eq!(analytics.top_tags[0].tag, "rust");
    assert_eq!(analytics.top_tags[0].count, 4);
}
