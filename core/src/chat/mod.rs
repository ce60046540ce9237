mod answerer;
mod chat;
mod error;
mod prompt;

pub use answerer::Answerer;
pub use chat::ChatModel;
pub use error::ChatError;
pub use prompt::{PromptTemplate, CONTEXT_SEPARATOR};
