//! Bearer-token authentication middleware.
//!
//! Token issuance lives outside this service; verification is a lookup of
//! the token's SHA-256 hash in `api_keys`. On success the resolved owner id
//! is inserted as a request extension for handlers to consume.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use cairn_core::ApiKeyStore;
use cairn_db::hash_token;

use crate::error::ApiError;
use crate::AppState;

/// Authenticated owner of the current request.
#[derive(Debug, Clone, Copy)]
pub struct Owner(pub Uuid);

/// Extract the bearer token from an Authorization header value.
fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Reject requests without a valid API key; attach [`Owner`] otherwise.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let owner_id = state
        .db
        .api_keys
        .resolve_owner(&hash_token(token))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;

    request.extensions_mut().insert(Owner(owner_id));
    Ok(next.run(request).await)
}

/// Global rate limiting, applied after authentication.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            return Err(ApiError::TooManyRequests(
                "Too many requests, please try again later".to_string(),
            ));
        }
    }
    Ok(next.run(request).await)
}
