mod error;
mod memory;

pub use error::CorpusError;
pub use memory::InMemoryCorpus;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// A stored passage together with its precomputed document embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: String,
    pub text: String,
    pub embedding: Embedding,
}

impl CorpusEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: impl Into<Embedding>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: embedding.into(),
        }
    }
}

/// Read access to the complete set of stored passages.
///
/// There is no paging at this level: `fetch_all` returns every entry in the store, in the order
/// the store reports them. An empty store is not an error.
#[async_trait]
pub trait CorpusReader: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<CorpusEntry>, CorpusError>;

    /// Human readable name of the backing collection, used in logs.
    fn source(&self) -> &str;
}
