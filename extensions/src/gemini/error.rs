use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use askplot_core::{chat::ChatError, embedding::EmbeddingError};

// ============== Shared Gemini API Error Structures ==============

/// The common error envelope returned by Google APIs.
#[derive(Deserialize, Debug, Clone)]
pub struct GeminiErrorResponse {
    pub error: GeminiErrorDetail,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GeminiErrorDetail {
    /// HTTP status code associated with the error (might differ from response status).
    pub code: u16,
    /// Developer-facing error message.
    pub message: String,
    /// Status string (e.g., "INVALID_ARGUMENT", "UNAUTHENTICATED").
    #[serde(default)]
    pub status: String,
}

// ============== Internal Gemini Client Error Enum ==============

/// Internal error type consolidating all possible failures within the Gemini client.
/// Converted into the public `ChatError` or `EmbeddingError` at the trait implementation
/// boundaries.
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to serialize request body: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    /// Error parsing a *successful* response body from the API.
    #[error("Failed to parse successful response body ({context}): {source}")]
    ResponseParsing {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Non-success status code from the API.
    #[error("Gemini API error: status={status}, message='{body_text}'")]
    ApiError {
        status: StatusCode,
        /// Parsed error details from the response body, if available.
        detail: Option<GeminiErrorDetail>,
        /// Raw response body text.
        body_text: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Success status but inconsistent data (e.g., embedding count mismatch).
    #[error("Unexpected response format or data: {0}")]
    UnexpectedResponse(String),

    /// The model produced no candidate, typically because the prompt was blocked.
    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Input batch size too large (limit: {limit:?}, actual: {actual})")]
    BatchTooLarge {
        limit: Option<usize>,
        actual: usize,
    },
}

impl GeminiError {
    /// Message for an `ApiError`: the parsed detail when available, the raw body otherwise.
    fn api_message(detail: Option<GeminiErrorDetail>, body_text: String) -> String {
        detail
            .map(|d| format!("{} (Status: {}, Code: {})", d.message, d.status, d.code))
            .unwrap_or(body_text)
    }
}

// ============== Shared Error Mapping Logic ==============

/// Converts a non-success `reqwest::Response` into `GeminiError::ApiError`.
///
/// Attempts to parse the body as a `GeminiErrorResponse`; if that fails the raw body text is
/// kept with no parsed detail. Returns `GeminiError::Network` if the body cannot be read.
pub(crate) async fn map_response_error(response: reqwest::Response) -> GeminiError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    match response.text().await {
        Ok(body_text) => {
            match serde_json::from_str::<GeminiErrorResponse>(&body_text) {
                Ok(parsed_error) => GeminiError::ApiError {
                    status,
                    detail: Some(parsed_error.error),
                    body_text,
                },
                Err(parse_err) => {
                    warn!(
                        status = %status,
                        error = %parse_err,
                        body = %body_text,
                        "Failed to parse Gemini error response JSON, returning raw body."
                    );
                    GeminiError::ApiError {
                        status,
                        detail: None,
                        body_text,
                    }
                }
            }
        }
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read Gemini error response body text.");
            GeminiError::Network(e)
        }
    }
}


// ============== From<GeminiError> for ChatError ==============

impl From<GeminiError> for ChatError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Network(source) => ChatError::Network(Box::new(source)),
            GeminiError::RequestSerialization(source) => {
                ChatError::InvalidRequest(format!("Failed to serialize request: {}", source))
            }
            GeminiError::ResponseParsing { source, .. } => ChatError::Parsing(Box::new(source)),
            GeminiError::ApiError { status, detail, body_text } => {
                let message = GeminiError::api_message(detail, body_text);
                match status {
                    StatusCode::BAD_REQUEST => ChatError::InvalidRequest(message),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatError::Authentication(message),
                    StatusCode::NOT_FOUND => ChatError::ModelNotFound(message),
                    StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimited,
                    _ => ChatError::Api {
                        status: Some(status.as_u16()),
                        message,
                    },
                }
            }
            GeminiError::InvalidConfiguration(msg) => ChatError::Configuration(msg),
            GeminiError::InvalidInput(msg) => ChatError::InvalidRequest(msg),
            GeminiError::UnexpectedResponse(msg) => ChatError::UnexpectedResponse(msg),
            GeminiError::Blocked(reason) => ChatError::ContentBlocked(reason),
            GeminiError::BatchTooLarge { .. } => {
                ChatError::Provider(format!("Unexpected batch size error during chat operation: {}", err).into())
            }
        }
    }
}


// ============== From<GeminiError> for EmbeddingError ==============

impl From<GeminiError> for EmbeddingError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Network(source) => EmbeddingError::Network(Box::new(source)),
            GeminiError::RequestSerialization(source) => {
                EmbeddingError::Provider(Box::new(GeminiError::RequestSerialization(source)))
            }
            GeminiError::ResponseParsing { source, .. } => EmbeddingError::Parsing(Box::new(source)),
            GeminiError::ApiError { status, detail, body_text } => {
                let message = GeminiError::api_message(detail, body_text);
                match status {
                    StatusCode::BAD_REQUEST => EmbeddingError::InvalidRequest(message),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EmbeddingError::Authentication(message),
                    StatusCode::NOT_FOUND => EmbeddingError::ModelNotFound(message),
                    StatusCode::TOO_MANY_REQUESTS => EmbeddingError::RateLimited,
                    _ => EmbeddingError::Api {
                        status: Some(status.as_u16()),
                        message,
                    },
                }
            }
            GeminiError::InvalidConfiguration(msg) => EmbeddingError::Configuration(msg),
            GeminiError::InvalidInput(msg) => EmbeddingError::InvalidRequest(msg),
            GeminiError::UnexpectedResponse(msg) => EmbeddingError::UnexpectedResponse(msg),
            GeminiError::Blocked(_) => {
                EmbeddingError::Provider(format!("Unexpected block during embedding operation: {}", err).into())
            }
            GeminiError::BatchTooLarge { limit, actual } => {
                EmbeddingError::BatchTooLarge { limit, actual }
            }
        }
    }
}
