//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

/// Error type returned by every handler. Maps core errors onto HTTP status
/// codes so callers can distinguish "doesn't exist" from "server error".
#[derive(Debug)]
pub enum ApiError {
    Internal(cairn_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    TooManyRequests(String),
}

impl From<cairn_core::Error> for ApiError {
    fn from(err: cairn_core::Error) -> Self {
        match &err {
            cairn_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            cairn_core::Error::RecordNotFound(id) => {
                ApiError::NotFound(format!("Record {} not found", id))
            }
            cairn_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            cairn_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = cairn_core::Error::RecordNotFound(Uuid::nil()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = cairn_core::Error::InvalidInput("bad".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_external_failures_map_to_500() {
        for core_err in [
            cairn_core::Error::Embedding("e".to_string()),
            cairn_core::Error::Inference("i".to_string()),
            cairn_core::Error::Index("x".to_string()),
            cairn_core::Error::Storage("s".to_string()),
        ] {
            let err: ApiError = core_err.into();
            assert!(matches!(err, ApiError::Internal(_)));
        }
    }

    #[test]
    fn test_response_status_codes() {
        let resp = ApiError::NotFound("x".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = ApiError::BadRequest("x".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = ApiError::TooManyRequests("x".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
