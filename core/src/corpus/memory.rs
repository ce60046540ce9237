use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{CorpusEntry, CorpusError, CorpusReader};

/// A corpus held entirely in memory.
///
/// Useful for local runs against an exported collection and for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    name: String,
    entries: Vec<CorpusEntry>,
}

impl InMemoryCorpus {
    pub fn new(name: impl Into<String>, entries: Vec<CorpusEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Loads entries from a JSON file containing an array of `{ "id", "text", "embedding" }`
    /// objects.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let entries: Vec<CorpusEntry> = serde_json::from_str(&raw)
            .map_err(|e| CorpusError::Parsing(Box::new(e)))?;
        debug!(path = %path.display(), count = entries.len(), "Loaded corpus file");
        Ok(Self::new(path.display().to_string(), entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CorpusReader for InMemoryCorpus {
    async fn fetch_all(&self) -> Result<Vec<CorpusEntry>, CorpusError> {
        Ok(self.entries.clone())
    }

    fn source(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_entries_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "a", "text": "first", "embedding": [1.0, 0.0]}},
                {{"id": "b", "text": "second", "embedding": [0.0, 1.0]}}
            ]"#
        )
        .unwrap();

        let corpus = InMemoryCorpus::from_json_file(file.path()).await.unwrap();
        let entries = corpus.fetch_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[1].embedding.as_slice(), &[0.0, 1.0]);
    }

    #[tokio::test]
    async fn rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"id": "a"}}"#).unwrap();

        let err = InMemoryCorpus::from_json_file(file.path()).await.unwrap_err();
        assert!(matches!(err, CorpusError::Parsing(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = InMemoryCorpus::from_json_file("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, CorpusError::Io(_)));
    }
}
