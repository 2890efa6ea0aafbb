//! Webhook request rejections and their HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::signature::SignatureError;

#[derive(Debug, Error)]
pub enum WebhookRejection {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] SignatureError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl WebhookRejection {
    /// HTTP status returned for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookRejection::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WebhookRejection::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(reason = %self, "Rejected webhook delivery");
        // Signature failures get no detail in the body.
        let body = match self {
            WebhookRejection::Unauthorized(_) => "unauthorized".to_string(),
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}
