use thiserror::Error;
use std::error::Error as StdError;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Network error during API communication (e.g., connection refused, timeout, DNS resolution failure).
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    /// Authentication failed (e.g., invalid API key, insufficient permissions).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Error reported by the API backend (e.g., bad request, server error).
    #[error("API error: status={status:?}, message={message}")]
    Api {
        /// Optional HTTP status code from the API response.
        status: Option<u16>,
        /// Error message provided by the API or synthesized by the client.
        message: String,
    },

    /// The request payload was deemed invalid before or by the backend.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Error parsing a *successful* response from the API.
    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Input batch size too large (limit: {limit:?}, actual: {actual})")]
    BatchTooLarge {
        limit: Option<usize>,
        actual: usize,
    },

    /// The backend answered successfully but the data is inconsistent (e.g., embedding count mismatch).
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Error related to the configuration of the client or provider.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An error specific to the underlying provider that doesn't fit other categories.
    #[error("Provider-specific error: {0}")]
    Provider(#[source] Box<dyn StdError + Send + Sync>),
}
