use thiserror::Error;

use crate::{chat::ChatError, corpus::CorpusError, embedding::{EmbeddingError, SimilarityError}};

use super::AskStage;

/// Failure of one of the external collaborators (or of scoring) while answering a question.
#[derive(Error, Debug)]
pub enum AskError {
    #[error("Failed to embed question: {0}")]
    Embedding(#[source] EmbeddingError),

    #[error("Failed to fetch corpus: {0}")]
    Corpus(#[source] CorpusError),

    #[error("Failed to score corpus: {0}")]
    Scoring(#[source] SimilarityError),

    #[error("Failed to generate answer: {0}")]
    Generation(#[source] ChatError),
}

impl AskError {
    /// The stage during which the failure happened.
    pub fn stage(&self) -> AskStage {
        match self {
            AskError::Embedding(_) => AskStage::Embedding,
            AskError::Corpus(_) => AskStage::FetchingCorpus,
            AskError::Scoring(_) => AskStage::Scoring,
            AskError::Generation(_) => AskStage::Generating,
        }
    }
}
