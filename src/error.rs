// src/error.rs
// Defines the application error type and its conversion into HTTP
// responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json; // For creating JSON error bodies

use crate::storage::StoreError;
use crate::views::RenderError;

#[derive(Debug)]
pub enum AppError {
    // Errors related to request processing
    BadRequest(String), // General bad request (e.g., invalid parameters)

    // The requested image does not exist
    NotFound(String),

    // Errors from view rendering
    RenderFailed(String),

    // Errors from the image store (create, write, list)
    StorageError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s),
            AppError::NotFound(s) => (StatusCode::NOT_FOUND, s),
            AppError::RenderFailed(s) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render view: {}", s),
            ),
            AppError::StorageError(s) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Image store operation failed: {}", s),
            ),
        };

        let body = Json(json!({
            "error": {
                "status": status.as_u16(),
                "message": error_message,
            }
        }));
        (status, body).into_response()
    }
}

// Implement From for the error types handlers bubble up, so they can use `?`.
impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart request: {}", err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            e @ StoreError::InvalidId(_) => AppError::BadRequest(e.to_string()),
            e @ StoreError::NotFound(_) => AppError::NotFound(e.to_string()),
            e => AppError::StorageError(e.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::RenderFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (status, _) = response_parts(AppError::BadRequest("bad".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = response_parts(AppError::NotFound("gone".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = response_parts(AppError::RenderFailed("oops".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = response_parts(AppError::StorageError("disk".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_body_carries_status_and_message() {
        let (status, body) = response_parts(AppError::NotFound("no such image".to_string())).await;
        assert_eq!(body["error"]["status"], status.as_u16());
        assert_eq!(body["error"]["message"], "no such image");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: AppError = StoreError::InvalidId("bad id".to_string()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = StoreError::NotFound("x.png".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = StoreError::ListFailed("io".to_string()).into();
        assert!(matches!(err, AppError::StorageError(_)));
    }
}
