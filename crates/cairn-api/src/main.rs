//! cairn API server.
//!
//! Axum HTTP server exposing the record store, semantic search, and
//! summarization pipeline. All `/api/records` routes are bearer-authenticated
//! and owner-scoped; `/health` is public.

mod auth;
mod error;
mod extract;
mod handlers;
mod services;

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use governor::{Quota, RateLimiter};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use cairn_core::{defaults, EmbeddingBackend, FileStorage, GenerationBackend};
use cairn_db::{create_pool, Database, FilesystemStorage};
use cairn_inference::CohereBackend;

pub type GlobalRateLimiter = governor::DefaultDirectRateLimiter;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub embeddings: Arc<dyn EmbeddingBackend>,
    pub generation: Arc<dyn GenerationBackend>,
    pub files: Arc<dyn FileStorage>,
    /// `None` disables rate limiting (RATE_LIMIT_PER_MINUTE=0).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "cairn_api=debug,cairn_db=info,cairn_inference=debug,tower_http=info",
        )
    });

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect()
}

fn allowed_origins() -> Vec<HeaderValue> {
    let raw = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());
    parse_allowed_origins(&raw)
}

fn rate_limiter_from_env() -> Option<Arc<GlobalRateLimiter>> {
    let per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(defaults::RATE_LIMIT_PER_MINUTE);
    let quota = Quota::per_minute(NonZeroU32::new(per_minute)?);
    Some(Arc::new(RateLimiter::direct(quota)))
}

fn router(state: AppState) -> Router {
    let records = Router::new()
        .route("/text", post(handlers::records::create_text))
        .route("/bookmark", post(handlers::records::create_bookmark))
        .route("/document", post(handlers::records::upload_document))
        .route("/", get(handlers::records::list_records))
        .route("/analytics", get(handlers::records::analytics))
        .route("/search", post(handlers::search::search))
        .route(
            "/:id",
            get(handlers::records::get_record)
                .put(handlers::records::update_record)
                .delete(handlers::records::delete_record),
        )
        .route("/:id/summarize", post(handlers::search::summarize))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins())
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api/records", records)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors)
        .layer(DefaultBodyLimit::max(defaults::UPLOAD_LIMIT_BYTES))
        .layer(RequestBodyLimitLayer::new(defaults::UPLOAD_LIMIT_BYTES))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let backend = Arc::new(CohereBackend::from_env()?);
    let embeddings: Arc<dyn EmbeddingBackend> = backend.clone();
    let generation: Arc<dyn GenerationBackend> = backend;
    let dimension = embeddings.dimension();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = create_pool(&database_url).await?;
    let db = Database::new(pool, dimension);
    db.migrate(dimension).await?;

    let files_path =
        std::env::var("CAIRN_FILES_PATH").unwrap_or_else(|_| "./data/files".to_string());
    let files: Arc<dyn FileStorage> = Arc::new(FilesystemStorage::new(files_path));

    let state = AppState {
        db,
        embeddings,
        generation,
        files,
        rate_limiter: rate_limiter_from_env(),
    };

    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(defaults::SERVER_PORT);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        subsystem = "api",
        component = "server",
        addr = %addr,
        dimension = dimension,
        "cairn API listening"
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
