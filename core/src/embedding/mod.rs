mod embedder;
mod error;
mod similarity;

pub use embedder::{Embedder, EmbeddingTask};
pub use error::EmbeddingError;
pub use similarity::{cosine_similarity, SimilarityError};

use serde::{Deserialize, Serialize};

/// A fixed-dimension vector produced by an embedding model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity between `self` and `other`.
    ///
    /// Fails if the two vectors have different dimensions.
    pub fn similarity(&self, other: &Embedding) -> Result<f32, SimilarityError> {
        cosine_similarity(&self.0, &other.0)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Embedding(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(embedding: Embedding) -> Self {
        embedding.0
    }
}
