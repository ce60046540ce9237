use std::sync::Arc;

use askplot_core::chat::{ChatError, ChatModel};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace, warn};

use super::error::{map_response_error, GeminiError};
use super::shared::SharedGeminiClient;

pub const DEFAULT_GEMINI_CHAT_MODEL: &str = "gemini-1.5-flash";

// ============== Gemini Specific Request/Response Structs ==============
// These structs mirror the Gemini API structure, restricted to single-turn text.

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize, Debug)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiRequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiRequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,
}

// --- Response Structs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

impl GeminiGenerateResponse {
    /// Concatenates the text parts of the first candidate.
    ///
    /// A response without candidates means the prompt was blocked; a candidate that stopped for
    /// safety reasons without any text is treated the same way.
    fn into_text(self) -> Result<String, GeminiError> {
        if let Some(usage) = &self.usage_metadata {
            debug!(
                prompt_tokens = ?usage.prompt_token_count,
                completion_tokens = ?usage.candidates_token_count,
                total_tokens = ?usage.total_token_count,
                "Gemini usage"
            );
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self.prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            warn!(%reason, "Gemini response contained no candidates.");
            return Err(GeminiError::Blocked(reason));
        };

        let text = candidate.content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII")) if text.is_empty() => {
                warn!(%reason, "Gemini candidate was filtered.");
                Err(GeminiError::Blocked(reason.to_string()))
            }
            reason => {
                if text.is_empty() {
                    debug!(finish_reason = ?reason, "Gemini candidate has no text content.");
                }
                Ok(text)
            }
        }
    }
}

/// Optional sampling settings sent with every request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationSettings {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// Client for Gemini's `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiChatClient {
    shared_client: Arc<SharedGeminiClient>,
    model_id: String,
    settings: GenerationSettings,
}

impl GeminiChatClient {
    #[instrument(name = "gemini_chat_client_new", skip(shared_client))]
    pub(crate) fn new_with_shared_client(
        shared_client: Arc<SharedGeminiClient>,
        model_id: String,
    ) -> Result<Self, GeminiError> {
        if model_id.trim().is_empty() {
            return Err(GeminiError::InvalidConfiguration("Model id cannot be empty".to_string()));
        }
        debug!(%model_id, "GeminiChatClient created.");
        Ok(Self {
            shared_client,
            model_id,
            settings: GenerationSettings::default(),
        })
    }

    #[must_use]
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> GenerationSettings {
        self.settings
    }

    fn generation_config(&self) -> Option<GeminiGenerationConfig> {
        let config = GeminiGenerationConfig {
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
            candidate_count: None,
        };
        // Only include config if something was set
        (config != GeminiGenerationConfig::default()).then(|| GeminiGenerationConfig {
            candidate_count: Some(1),
            ..config
        })
    }

    async fn generate_inner(&self, prompt: &str) -> Result<String, GeminiError> {
        let path_segment = format!("models/{}:generateContent", self.model_id);
        let url = self.shared_client.build_url(&path_segment)?;
        debug!(%url, model_id = %self.model_id, "Sending generate request to Gemini");

        let request_body = GeminiGenerateRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiRequestPart { text: prompt }],
            }],
            generation_config: self.generation_config(),
        };

        let request_json = serde_json::to_string(&request_body)
            .map_err(|e| {
                error!(error = %e, "Failed to serialize Gemini generate request body");
                GeminiError::RequestSerialization(e)
            })?;
        trace!(body = %request_json, "Constructed Gemini request body JSON");

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
            error!(%status, "Gemini generate API returned error status");
            return Err(map_response_error(response).await);
        }

        let raw_body = response.text()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read successful response body for generate");
                GeminiError::Network(e)
            })?;
        trace!(body = %raw_body, "Received Gemini generate response body");

        let gemini_response: GeminiGenerateResponse = serde_json::from_str(&raw_body)
            .map_err(|e| {
                error!(parse_error = %e, "Failed to parse Gemini generate response JSON");
                GeminiError::ResponseParsing {
                    context: "Parsing generate response".to_string(),
                    source: e,
                }
            })?;

        gemini_response.into_text()
    }
}

#[async_trait]
impl ChatModel for GeminiChatClient {
    #[instrument(skip(self, prompt), fields(model = %self.model_id))]
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.generate_inner(prompt).await.map_err(Into::into)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
