use askplot_core::pipeline::AskError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Failure of an `/api/ask` request, rendered as the `{ error, details? }` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request body must be a JSON object.")]
    InvalidBody,

    #[error("No question provided.")]
    MissingQuestion,

    /// Any dependency failure. The message is generic; the cause goes into `details`.
    #[error("An internal server error occurred.")]
    Pipeline(#[from] AskError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody | ApiError::MissingQuestion => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            ApiError::Pipeline(err) => {
                error!(stage = %err.stage(), error = %err, "Ask request failed");
                Some(err.to_string())
            }
            other => {
                warn!(error = %other, "Rejected ask request");
                None
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
