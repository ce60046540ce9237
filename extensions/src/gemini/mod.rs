use std::sync::Arc;

mod chat;
mod embed;
mod shared;
mod error;

pub use chat::{GeminiChatClient, GenerationSettings, DEFAULT_GEMINI_CHAT_MODEL};
pub use embed::{GeminiEmbedder, DEFAULT_GEMINI_EMBEDDING_MODEL};
pub use error::{GeminiError, GeminiErrorDetail};
pub use shared::GeminiConfig;
use reqwest::Client;
use shared::SharedGeminiClient;

/// Entry point to the Gemini API.
///
/// Holds one HTTP client and configuration; the embedders and chat clients it hands out share
/// them.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    shared_client: Arc<SharedGeminiClient>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeminiError> {
        Self::from_config(GeminiConfig::new(api_key)?, None)
    }

    pub fn from_config(config: GeminiConfig, client_override: Option<Client>) -> Result<Self, GeminiError> {
        let shared_client = SharedGeminiClient::new(config, client_override)?;
        Ok(GeminiClient {
            shared_client: Arc::new(shared_client),
        })
    }

    /// An embedder for `model_name`, e.g. "text-embedding-004".
    pub fn embedder(&self, model_name: impl Into<String>) -> Result<GeminiEmbedder, GeminiError> {
        GeminiEmbedder::new_with_shared_client(self.shared_client.clone(), model_name.into())
    }

    /// A generative client for `model_id`, e.g. "gemini-1.5-flash".
    pub fn chat(&self, model_id: impl Into<String>) -> Result<GeminiChatClient, GeminiError> {
        GeminiChatClient::new_with_shared_client(self.shared_client.clone(), model_id.into())
    }
}
