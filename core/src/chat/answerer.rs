use std::sync::Arc;

use tracing::{debug, instrument};

use super::{ChatError, ChatModel, PromptTemplate};

/// Wraps retrieved passages and a question into a prompt and asks the model.
#[derive(Clone)]
pub struct Answerer {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
}

impl Answerer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self::with_template(model, PromptTemplate::default())
    }

    pub fn with_template(model: Arc<dyn ChatModel>, template: PromptTemplate) -> Self {
        Self { model, template }
    }

    pub fn build_prompt<S: AsRef<str>>(&self, question: &str, contexts: &[S]) -> String {
        self.template.build_prompt(question, contexts)
    }

    /// Builds the prompt and delegates to the model. Failures are returned as-is.
    #[instrument(skip_all, fields(model = %self.model.model_id(), contexts = contexts.len()))]
    pub async fn answer<S: AsRef<str> + Sync>(&self, question: &str, contexts: &[S]) -> Result<String, ChatError> {
        let prompt = self.build_prompt(question, contexts);
        debug!(prompt_chars = prompt.chars().count(), "Sending prompt to chat model");
        self.model.generate(&prompt).await
    }
}
