use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Upload too large: {size} bytes (max {max})")]
    UploadTooLarge { size: usize, max: usize },

    #[error("Upload storage error: {0}")]
    UploadStorage(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Chat hub is not running")]
    HubUnavailable,

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::UploadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ServerError::UploadStorage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Upload storage error".to_string(),
            ),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::HubUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            // Body limit violations surface here as 413.
            ServerError::Multipart(e) => (e.status(), e.body_text()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
