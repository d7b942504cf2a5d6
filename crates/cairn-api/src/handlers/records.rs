//! Record CRUD and analytics handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use cairn_core::{
    Analytics, NewRecord, Record, RecordKind, RecordRepository, RecordUpdate,
};

use crate::auth::Owner;
use crate::error::ApiError;
use crate::services::indexing;
use crate::{extract, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTextRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /api/records/text
pub async fn create_text(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Json(req): Json<CreateTextRequest>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let new = NewRecord::Text {
        title: req.title,
        body: req.body,
        tags: req.tags,
    };
    let record = create_and_index(&state, owner_id, new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/records/bookmark
pub async fn create_bookmark(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Json(req): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let new = NewRecord::Bookmark {
        title: req.title,
        url: req.url,
        description: req.description,
        tags: req.tags,
    };
    let record = create_and_index(&state, owner_id, new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/records/document (multipart: title, tags, file)
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let mut title: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                title = Some(read_text_field(field).await?);
            }
            Some("tags") => {
                tags = parse_tags(&read_text_field(field).await?);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.pdf")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    // Validate before any side effect: a missing title or corrupt PDF
    // stores nothing.
    let title = title.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title is required and must be a non-empty string".to_string(),
        ));
    }
    let (filename, data) = file
        .ok_or_else(|| ApiError::BadRequest("A PDF file is required".to_string()))?;

    let extracted_text = extract::extract_pdf_text(&data)?;

    let stored = state.files.store(&filename, &data).await?;
    info!(
        subsystem = "api",
        component = "records",
        op = "upload",
        owner_id = %owner_id,
        file_url = %stored.url,
        size_bytes = stored.size_bytes,
        extracted_chars = extracted_text.chars().count(),
        "Stored uploaded document"
    );

    let new = NewRecord::Document {
        title,
        extracted_text,
        file_url: stored.url,
        tags,
    };
    let record = create_and_index(&state, owner_id, new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/records
pub async fn list_records(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.db.records.list(owner_id).await?))
}

/// GET /api/records/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(state.db.records.analytics(owner_id).await?))
}

/// GET /api/records/:id
pub async fn get_record(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Path(id): Path<Uuid>,
) -> Result<Json<Record>, ApiError> {
    Ok(Json(state.db.records.fetch(owner_id, id).await?))
}

/// PUT /api/records/:id
pub async fn update_record(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Path(id): Path<Uuid>,
    Json(update): Json<RecordUpdate>,
) -> Result<Json<Record>, ApiError> {
    let mut record = state.db.records.fetch(owner_id, id).await?;
    let reindex = update.affects_embedding();
    record.apply(update);
    record.validate()?;

    let record = state.db.records.update(owner_id, &record).await?;
    if reindex {
        indexing::index_record(state.embeddings.as_ref(), &state.db.vectors, &record).await?;
    }
    Ok(Json(record))
}

/// DELETE /api/records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(Owner(owner_id)): Extension<Owner>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let record = state.db.records.fetch(owner_id, id).await?;
    state.db.records.delete(owner_id, id).await?;

    // The record is gone; cleanup of derived data is best effort.
    indexing::deindex_record(&state.db.vectors, id).await;
    if record.kind == RecordKind::Document {
        if let Some(url) = &record.external_url {
            if let Err(err) = state.files.delete(url).await {
                warn!(
                    subsystem = "api",
                    component = "records",
                    record_id = %id,
                    file_url = %url,
                    error_msg = %err,
                    "Failed to delete stored file"
                );
            }
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn create_and_index(
    state: &AppState,
    owner_id: Uuid,
    new: NewRecord,
) -> Result<Record, ApiError> {
    let record = state.db.records.insert(owner_id, new).await?;
    indexing::index_record(state.embeddings.as_ref(), &state.db.vectors, &record).await?;
    info!(
        subsystem = "api",
        component = "records",
        op = "create",
        owner_id = %owner_id,
        record_id = %record.id,
        kind = %record.kind,
        "Record created and indexed"
    );
    Ok(record)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart field: {}", e)))
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::{Extension, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    use cairn_db::{Database, FilesystemStorage};
    use cairn_inference::MockBackend;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("rust, async , db"), vec!["rust", "async", "db"]);
        assert_eq!(parse_tags(""), Vec::<String>::new());
        assert_eq!(parse_tags(" , ,"), Vec::<String>::new());
    }

    // State with a lazy pool: nothing connects unless a handler reaches the
    // database, which these requests must not.
    fn state_with_files(files_path: &std::path::Path) -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cairn_test")
            .unwrap();
        let backend = Arc::new(MockBackend::new());
        AppState {
            db: Database::new(pool, 1024),
            embeddings: backend.clone(),
            generation: backend,
            files: Arc::new(FilesystemStorage::new(files_path)),
            rate_limiter: None,
        }
    }

    fn upload_app(state: AppState) -> Router {
        Router::new()
            .route("/document", post(upload_document))
            .layer(Extension(Owner(Uuid::new_v4())))
            .with_state(state)
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "cairn-test-boundary";
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{}\r\n", boundary));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        Request::builder()
            .method("POST")
            .uri("/document")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn error_message(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_upload_without_title_is_rejected_before_any_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let app = upload_app(state_with_files(dir.path()));

        let request =
            multipart_request(&[("file", Some("report.pdf"), "%PDF-1.4 pretend content")]);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("Title is required"));
        // Nothing was stored.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_with_blank_title_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = upload_app(state_with_files(dir.path()));

        let request = multipart_request(&[
            ("title", None, "   "),
            ("file", Some("report.pdf"), "%PDF-1.4 pretend content"),
        ]);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("Title is required"));
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = upload_app(state_with_files(dir.path()));

        let request = multipart_request(&[("title", None, "Quarterly report")]);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("PDF file is required"));
    }
}
