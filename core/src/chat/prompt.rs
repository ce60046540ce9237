use serde::{Deserialize, Serialize};

/// Placed between retrieved passages so the model can tell them apart.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const DEFAULT_PERSONA: &str = "You are a professional manga editor.";

const DEFAULT_INSTRUCTIONS: &str = "Answer the user's \"Question\" based only on the \"Reference information\" \
provided below. Do not use any other knowledge. If the reference information does not contain the \
answer, say so.";

/// The fixed instructional frame around retrieved passages and the user's question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Who the model should act as.
    pub persona: String,
    /// How the model must use the reference information.
    pub instructions: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Keeps the default instructions but swaps the persona line.
    pub fn with_persona(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            ..Default::default()
        }
    }

    /// Assembles the final prompt.
    ///
    /// `contexts` are used in the given order (best match first) and joined with
    /// [`CONTEXT_SEPARATOR`]. With no contexts the reference block is left empty; the
    /// instructions still tell the model to answer only from it.
    pub fn build_prompt<S: AsRef<str>>(&self, question: &str, contexts: &[S]) -> String {
        let context = contexts.iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        format!(
            "{} {}\n\n# Reference information\n---\n{}\n---\n\n# Question\n{}",
            self.persona, self.instructions, context, question,
        )
    }
}
