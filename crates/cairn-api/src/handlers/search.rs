//! Semantic search and summarization handlers.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use cairn_core::{
    defaults, resolve_candidates, EmbedInputType, Record, RecordRepository, VectorIndex,
};

use crate::auth::Owner;
use crate::error::ApiError;
use crate::services::qa;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub answer: String,
    pub records: Vec<Record>,
}

/// POST /api/records/search
///
/// Embed the query, rank the caller's records by similarity, assemble a
/// bounded context, and answer over it. Generation failure degrades to an
/// empty answer with the ranked records intact.
pub async fn search(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Query is required and must be a non-empty string".to_string(),
        ));
    }
    let top_k = req.top_k.unwrap_or(defaults::SEARCH_TOP_K);
    let start = Instant::now();

    let query_vector = state
        .embeddings
        .embed(&req.query, EmbedInputType::Query)
        .await?;
    let hits = state
        .db
        .vectors
        .query(owner_id, &query_vector, top_k)
        .await?;
    debug!(
        subsystem = "api",
        component = "search",
        owner_id = %owner_id,
        result_count = hits.len(),
        top_k = top_k,
        "Similarity search complete"
    );

    let ids: Vec<Uuid> = hits.iter().map(|h| h.record_ref).collect();
    let fetched = state.db.records.fetch_many(owner_id, &ids).await?;
    let records = resolve_candidates(&hits, fetched);

    let (answer, _context) =
        qa::answer_for(state.generation.as_ref(), &req.query, &records).await;

    info!(
        subsystem = "api",
        component = "search",
        owner_id = %owner_id,
        result_count = records.len(),
        answered = !answer.is_empty(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Search complete"
    );

    Ok(Json(SearchResponse { answer, records }))
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// POST /api/records/:id/summarize
///
/// Unlike search, a generation failure here is fatal: the summary is the
/// entire response.
pub async fn summarize(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let record = state.db.records.fetch(owner_id, id).await?;

    let text = record.embedding_text();
    if text.chars().count() < defaults::SUMMARY_MIN_CHARS {
        return Err(ApiError::BadRequest(
            "Not enough content to summarize".to_string(),
        ));
    }

    let summary = qa::summarize(state.generation.as_ref(), &record).await?;
    Ok(Json(SummarizeResponse { summary }))
}
