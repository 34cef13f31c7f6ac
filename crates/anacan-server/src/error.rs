use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use anacan_provision::RemoteError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Remote(_) => (StatusCode::BAD_GATEWAY, "Remote service error".to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
