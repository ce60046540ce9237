use std::{fmt, sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    chat::Answerer,
    corpus::CorpusReader,
    embedding::{Embedder, EmbeddingTask},
    retrieval::{rank_top_k, ScoredEntry},
};

use super::AskError;

/// Number of passages handed to the model unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub top_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

/// The steps a question goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AskStage {
    Embedding,
    FetchingCorpus,
    Scoring,
    Generating,
}

impl fmt::Display for AskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AskStage::Embedding => "embedding",
            AskStage::FetchingCorpus => "fetching_corpus",
            AskStage::Scoring => "scoring",
            AskStage::Generating => "generating",
        };
        f.write_str(name)
    }
}

/// The answer plus the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskOutcome {
    pub answer: String,
    pub contexts: Vec<ScoredEntry>,
}

/// Embeds a question, ranks the whole corpus against it and asks the model.
///
/// External calls run strictly one after another. The first failure aborts the request; nothing
/// is retried and no partial answer is produced.
#[derive(Clone)]
pub struct AskPipeline {
    embedder: Arc<dyn Embedder>,
    corpus: Arc<dyn CorpusReader>,
    answerer: Answerer,
    options: PipelineOptions,
}

impl AskPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        corpus: Arc<dyn CorpusReader>,
        answerer: Answerer,
        options: PipelineOptions,
    ) -> Self {
        Self { embedder, corpus, answerer, options }
    }

    #[instrument(name = "ask", skip_all, fields(top_k = self.options.top_k, corpus = %self.corpus.source()))]
    pub async fn ask(&self, question: &str) -> Result<AskOutcome, AskError> {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_millis() as u64;

        debug!(stage = %AskStage::Embedding, model = %self.embedder.model_name(), "Embedding question");
        let query = self.embedder
            .embed_one(question, EmbeddingTask::RetrievalQuery)
            .await
            .map_err(AskError::Embedding)?;
        info!(elapsed_ms = elapsed_ms(), dimensions = query.dimensions(), "Embedded question");

        debug!(stage = %AskStage::FetchingCorpus, "Fetching corpus");
        let entries = self.corpus.fetch_all().await.map_err(AskError::Corpus)?;
        info!(elapsed_ms = elapsed_ms(), count = entries.len(), "Fetched corpus");
        if entries.is_empty() {
            warn!("Corpus is empty; answering without reference information");
        }

        debug!(stage = %AskStage::Scoring, "Scoring corpus");
        let contexts = rank_top_k(&query, &entries, self.options.top_k).map_err(AskError::Scoring)?;
        info!(
            elapsed_ms = elapsed_ms(),
            selected = contexts.len(),
            best_score = contexts.first().map(|c| c.score),
            "Ranked corpus"
        );

        debug!(stage = %AskStage::Generating, "Generating answer");
        let texts = contexts.iter().map(|c| c.text.as_str()).collect::<Vec<_>>();
        let answer = self.answerer
            .answer(question, &texts)
            .await
            .map_err(AskError::Generation)?;
        info!(elapsed_ms = elapsed_ms(), answer_chars = answer.chars().count(), "Generated answer");

        Ok(AskOutcome { answer, contexts })
    }
}
