use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{error::EmbeddingError, Embedding};

/// Trait for asynchronous text embedding generation.
///
/// An implementor represents a specific configured embedding model (e.g., a connection to
/// Gemini's `text-embedding-004`). Queries and stored documents are embedded with different
/// task hints; the returned vectors live in the same space either way.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generates embeddings for a batch of texts.
    ///
    /// Implementations return exactly one embedding per input text, in input order. They should
    /// use `EmbeddingError::BatchTooLarge` when the batch exceeds what the backend accepts.
    async fn embed(&self, texts: &[&str], task: EmbeddingTask) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embeds a single text.
    async fn embed_one(&self, text: &str, task: EmbeddingTask) -> Result<Embedding, EmbeddingError> {
        let mut embeddings = self.embed(&[text], task).await?;
        match (embeddings.pop(), embeddings.is_empty()) {
            (Some(embedding), true) => Ok(embedding),
            _ => Err(EmbeddingError::UnexpectedResponse(
                "expected exactly one embedding for a single input".to_string(),
            )),
        }
    }

    /// Identifier of the configured model (e.g. "text-embedding-004").
    fn model_name(&self) -> &str;

    /// Number of dimensions of the produced vectors, if known ahead of time.
    fn dimensions(&self) -> Option<usize>;

    /// Maximum number of texts accepted by a single `embed` call, if limited.
    fn max_batch_size_hint(&self) -> Option<usize> {
        None
    }
}

/// The two retrieval modes an embedding can be produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingTask {
    /// A user question that will be compared against stored documents.
    RetrievalQuery,
    /// A passage stored in the corpus.
    RetrievalDocument,
}

impl EmbeddingTask {
    pub fn as_gemini_task_type(&self) -> &'static str {
        match self {
            EmbeddingTask::RetrievalQuery => "RETRIEVAL_QUERY",
            EmbeddingTask::RetrievalDocument => "RETRIEVAL_DOCUMENT",
        }
    }
}
