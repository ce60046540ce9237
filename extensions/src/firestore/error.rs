use reqwest::StatusCode;
use thiserror::Error;

use askplot_core::corpus::CorpusError;

/// Internal error type of the Firestore client, converted into `CorpusError` at the
/// `CorpusReader` boundary. Messages never include access tokens or key material.
#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid service account key: {0}")]
    InvalidServiceAccount(String),

    #[error("Failed to sign token request: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The OAuth token endpoint refused the grant.
    #[error("Token exchange failed: status={status}, message='{message}'")]
    TokenExchange { status: StatusCode, message: String },

    #[error("Firestore API error: status={status}, message='{message}'")]
    ApiError { status: StatusCode, message: String },

    #[error("Failed to parse response body ({context}): {source}")]
    ResponseParsing {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed document '{id}': {reason}")]
    MalformedDocument { id: String, reason: String },
}

impl From<FirestoreError> for CorpusError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::Network(source) => CorpusError::Network(Box::new(source)),
            FirestoreError::InvalidConfiguration(msg) => CorpusError::Configuration(msg),
            FirestoreError::InvalidServiceAccount(msg) => CorpusError::Configuration(msg),
            FirestoreError::Signing(source) => {
                CorpusError::Authentication(format!("failed to sign token request: {}", source))
            }
            FirestoreError::TokenExchange { status, message } => {
                CorpusError::Authentication(format!("token exchange failed ({}): {}", status, message))
            }
            FirestoreError::ApiError { status, message } => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CorpusError::Authentication(message),
                _ => CorpusError::Api { status: Some(status.as_u16()), message },
            },
            FirestoreError::ResponseParsing { source, .. } => CorpusError::Parsing(Box::new(source)),
            FirestoreError::MalformedDocument { id, reason } => CorpusError::MalformedDocument { id, reason },
        }
    }
}

/// Reads the body of a non-success response, preferring the `error.message` of Google's error
/// envelope over the raw text.
pub(crate) async fn error_message(response: reqwest::Response) -> Result<(StatusCode, String), FirestoreError> {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(serde::Deserialize)]
    struct Detail {
        message: String,
    }

    let status = response.status();
    let body = response.text().await?;
    let message = serde_json::from_str::<Envelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Ok((status, message))
}
