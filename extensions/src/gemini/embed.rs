use std::sync::Arc;

use async_trait::async_trait;
use askplot_core::embedding::{Embedder, Embedding, EmbeddingError, EmbeddingTask};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace, warn};
use url::Url;
use secrecy::ExposeSecret;

use super::{error::{map_response_error, GeminiError}, shared::SharedGeminiClient};

pub const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "text-embedding-004";

// The maximum batch size for batchEmbedContents requests.
const BATCH_LIMIT: usize = 100;

/// Embedder implementation for Google Gemini models via the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    shared_client: Arc<SharedGeminiClient>,
    model_name: String,         // e.g. "text-embedding-004"
    model_path_segment: String, // e.g. "models/text-embedding-004"
    dimensions: Option<usize>,
}

impl GeminiEmbedder {
    #[instrument(name = "gemini_embedder_new", skip(shared_client))]
    pub(crate) fn new_with_shared_client(
        shared_client: Arc<SharedGeminiClient>,
        model_name: String,
    ) -> Result<Self, GeminiError> {
        if model_name.trim().is_empty() {
            return Err(GeminiError::InvalidConfiguration("Model name cannot be empty".to_string()));
        }

        let model_path_segment = format!("models/{}", model_name);

        let dimensions = match model_name.as_str() {
            "text-embedding-004" | "embedding-001" => Some(768),
            "gemini-embedding-001" => Some(3072),
            _ => {
                warn!(model = %model_name, "Unknown Gemini embedding model, dimensions not set.");
                None
            }
        };

        debug!(model = %model_name, dimensions = ?dimensions, "GeminiEmbedder created.");

        Ok(Self {
            shared_client,
            model_name,
            model_path_segment,
            dimensions,
        })
    }

    fn build_batch_embed_url(&self) -> Result<Url, GeminiError> {
        let path_segment = format!("{}:batchEmbedContents", self.model_path_segment);
        self.shared_client.build_url(&path_segment)
    }

    async fn embed_inner(&self, texts: &[&str], task: EmbeddingTask) -> Result<Vec<Embedding>, GeminiError> {
        if texts.is_empty() {
            debug!("Input texts slice is empty, returning empty embeddings.");
            return Ok(vec![]);
        }

        if texts.len() > BATCH_LIMIT {
            error!(requested = texts.len(), limit = BATCH_LIMIT, "Batch size exceeds limit");
            return Err(GeminiError::BatchTooLarge {
                limit: Some(BATCH_LIMIT),
                actual: texts.len(),
            });
        }

        let url = self.build_batch_embed_url()?;
        debug!(%url, "Sending batch embed request to Gemini");

        let task_type = task.as_gemini_task_type();
        let requests: Vec<GeminiEmbedRequest> = texts
            .iter()
            .map(|&text| GeminiEmbedRequest {
                model: &self.model_path_segment,
                content: GeminiContent {
                    parts: vec![GeminiPart { text }],
                },
                task_type: Some(task_type),
            })
            .collect();

        let request_json = serde_json::to_string(&GeminiBatchRequest { requests })
            .map_err(|e| {
                error!(error = %e, "Failed to serialize Gemini embed request body");
                GeminiError::RequestSerialization(e)
            })?;
        trace!(body = %request_json, "Constructed Gemini embed request body JSON");

        let response = self.shared_client.http_client()
            .post(url)
            .header("x-goog-api-key", self.shared_client.config().api_key.expose_secret())
            .header("Content-Type", "application/json")
            .body(request_json)
            .send()
            .await
            .map_err(GeminiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Gemini embed API returned error status");
            return Err(map_response_error(response).await);
        }

        let raw_body = response.text()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read successful response body for embed");
                GeminiError::Network(e)
            })?;
        trace!(body = %raw_body, "Received Gemini embed response body");

        let response_data: GeminiBatchResponse = serde_json::from_str(&raw_body)
            .map_err(|e| {
                error!(parse_error = %e, "Failed to parse Gemini embed response JSON");
                GeminiError::ResponseParsing {
                    context: "Parsing batch embed response".to_string(),
                    source: e,
                }
            })?;

        if response_data.embeddings.len() != texts.len() {
            let msg = format!(
                "API returned {} embeddings, but expected {}",
                response_data.embeddings.len(), texts.len()
            );
            error!(message = %msg, "Mismatch between input text count and received embeddings count");
            return Err(GeminiError::UnexpectedResponse(msg));
        }

        debug!("Successfully parsed Gemini embed response, received {} embeddings.", response_data.embeddings.len());
        Ok(response_data.embeddings
            .into_iter()
            .map(|e| Embedding::from(e.values))
            .collect())
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    #[instrument(skip(self, texts), fields(model = %self.model_name, num_texts = texts.len()))]
    async fn embed(&self, texts: &[&str], task: EmbeddingTask) -> Result<Vec<Embedding>, EmbeddingError> {
        self.embed_inner(texts, task).await.map_err(Into::into)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn max_batch_size_hint(&self) -> Option<usize> {
        Some(BATCH_LIMIT)
    }
}

// --- Gemini API Request Structures ---

#[derive(Serialize, Debug)]
struct GeminiBatchRequest<'a> {
    requests: Vec<GeminiEmbedRequest<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbedRequest<'a> {
    model: &'a str, // Full model path, e.g., "models/text-embedding-004"
    content: GeminiContent<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<&'a str>,
}

#[derive(Serialize, Debug)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiPart<'a> {
    text: &'a str,
}

// --- Gemini API Response Structures ---

#[derive(Deserialize, Debug)]
struct GeminiBatchResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbeddingValue>,
}

#[derive(Deserialize, Debug)]
struct GeminiEmbeddingValue {
    values: Vec<f32>,
}
