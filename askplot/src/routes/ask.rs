use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// `POST /api/ask`
///
/// The body is read as raw bytes; malformed input of any content type is answered with the
/// `{ "error" }` envelope.
#[instrument(skip_all)]
pub async fn ask(State(state): State<AppState>, body: Bytes) -> Result<Json<AskResponse>, ApiError> {
    let question = parse_question(&body)?;
    info!(question_chars = question.chars().count(), "Answering question");

    let outcome = state.pipeline.ask(&question).await?;
    debug!(contexts = outcome.contexts.len(), answer_chars = outcome.answer.chars().count(), "Answered question");

    Ok(Json(AskResponse { answer: outcome.answer }))
}

/// Extracts a non-blank question from a JSON object body. The question is returned as sent;
/// surrounding whitespace only matters for the blank check.
fn parse_question(body: &[u8]) -> Result<String, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Request body is not valid JSON");
        ApiError::InvalidBody
    })?;
    if !value.is_object() {
        return Err(ApiError::InvalidBody);
    }

    // A question of the wrong type counts as missing.
    let request: AskRequest = serde_json::from_value(value).map_err(|_| ApiError::MissingQuestion)?;
    request.question
        .filter(|q| !q.trim().is_empty())
        .ok_or(ApiError::MissingQuestion)
}
