use thiserror::Error;
use std::error::Error as StdError;


#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API error: status={status:?}, message={message}")]
    Api { status: Option<u16>, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The model refused to answer (safety filters, blocked prompt).
    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider-specific error: {0}")]
    Provider(#[source] Box<dyn StdError + Send + Sync>),
}
