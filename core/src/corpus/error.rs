use std::error::Error as StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Document store error: status={status:?}, message={message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// A stored document lacks the expected fields or has them in the wrong shape.
    #[error("Malformed document '{id}': {reason}")]
    MalformedDocument { id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
