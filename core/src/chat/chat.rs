use async_trait::async_trait;

use super::ChatError;

/// A generative text model that answers a single prompt.
///
/// There is no conversation state: every call is an independent, single-turn request. No
/// streaming, and no retry on the implementor's side.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends `prompt` to the model and returns the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;

    /// Identifier of the model answering requests (e.g. "gemini-1.5-flash").
    fn model_id(&self) -> &str;
}
