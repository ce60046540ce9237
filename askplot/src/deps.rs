use std::{sync::Arc, time::Duration};

use askplot_core::{
    chat::{Answerer, ChatError, ChatModel, PromptTemplate},
    corpus::{CorpusEntry, CorpusError, CorpusReader, InMemoryCorpus},
    embedding::{Embedder, Embedding, EmbeddingError, EmbeddingTask},
    pipeline::{AskPipeline, PipelineOptions},
};
use askplot_extensions::{
    firestore::{FirestoreConfig, FirestoreCorpus, FirestoreError, ServiceAccountKey, TokenSource},
    gemini::{GeminiChatClient, GeminiClient, GeminiConfig, GeminiError},
};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cli::{Cli, CorpusArgs, GeminiArgs};

/// Reasons a collaborator could not be set up at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error(transparent)]
    Firestore(#[from] FirestoreError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Process-wide client handles, built once at startup and shared by every request.
#[derive(Clone)]
pub struct Dependencies {
    pub embedder: Arc<dyn Embedder>,
    pub corpus: Arc<dyn CorpusReader>,
    pub chat: Arc<dyn ChatModel>,
}

impl Dependencies {
    /// Builds every collaborator from the command line. A collaborator that cannot be built is
    /// logged and replaced by [`Unavailable`], so the server still starts and requests fail with
    /// a 500 instead.
    pub async fn init(cli: &Cli) -> Self {
        let timeout = cli.request_timeout();
        let (embedder, chat) = match gemini_client(&cli.gemini, timeout) {
            Ok(client) => (embedder(&client, &cli.gemini), chat_model(&client, &cli.gemini)),
            Err(e) => {
                let stand_in = unavailable("gemini", e);
                (stand_in.clone() as Arc<dyn Embedder>, stand_in as Arc<dyn ChatModel>)
            }
        };
        let corpus: Arc<dyn CorpusReader> = match build_corpus(&cli.corpus, timeout).await {
            Ok(corpus) => corpus,
            Err(e) => unavailable("corpus", e),
        };

        info!(
            embedding_model = embedder.model_name(),
            chat_model = chat.model_id(),
            corpus = corpus.source(),
            "Dependencies initialized"
        );
        Self { embedder, corpus, chat }
    }

    pub fn pipeline(&self, template: PromptTemplate, options: PipelineOptions) -> AskPipeline {
        let answerer = Answerer::with_template(self.chat.clone(), template);
        AskPipeline::new(self.embedder.clone(), self.corpus.clone(), answerer, options)
    }
}

fn unavailable(component: &'static str, err: ConfigError) -> Arc<Unavailable> {
    error!(component, error = %err, "Configuration error, requests will fail until restarted");
    Arc::new(Unavailable::new(component, err.to_string()))
}

fn embedder(client: &GeminiClient, args: &GeminiArgs) -> Arc<dyn Embedder> {
    match client.embedder(args.embedding_model.as_str()) {
        Ok(embedder) => Arc::new(embedder),
        Err(e) => unavailable("embedder", e.into()),
    }
}

fn chat_model(client: &GeminiClient, args: &GeminiArgs) -> Arc<dyn ChatModel> {
    match chat_client(client, args) {
        Ok(chat) => Arc::new(chat),
        Err(e) => unavailable("chat model", e.into()),
    }
}

fn chat_client(client: &GeminiClient, args: &GeminiArgs) -> Result<GeminiChatClient, GeminiError> {
    Ok(client.chat(args.chat_model.as_str())?.with_settings(args.generation_settings()))
}

fn gemini_client(args: &GeminiArgs, timeout: Duration) -> Result<GeminiClient, ConfigError> {
    let api_key = args.api_key.clone().ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
    let mut config = GeminiConfig::new(api_key)?.timeout(timeout);
    if let Some(url) = &args.base_url {
        config = config.base_url(url)?;
    }
    Ok(GeminiClient::from_config(config, None)?)
}

/// Picks the corpus backend: a local JSON file, the Firestore emulator, or Firestore proper.
pub async fn build_corpus(args: &CorpusArgs, timeout: Duration) -> Result<Arc<dyn CorpusReader>, ConfigError> {
    if let Some(path) = &args.corpus_file {
        let corpus = InMemoryCorpus::from_json_file(path).await?;
        if corpus.is_empty() {
            warn!(path = %path.display(), "Corpus file holds no entries");
        } else {
            info!(path = %path.display(), entries = corpus.len(), "Serving corpus from file");
        }
        return Ok(Arc::new(corpus));
    }

    if let Some(host) = &args.emulator_host {
        let project_id = args.project_id.clone().ok_or(ConfigError::Missing("FIRESTORE_PROJECT_ID"))?;
        let config = FirestoreConfig::new(project_id)?
            .database(args.database.as_str())
            .collection(args.collection.as_str())
            .timeout(timeout)
            .emulator_host(host)?;
        info!(%host, collection = %args.collection, "Using Firestore emulator");
        return Ok(Arc::new(FirestoreCorpus::new(config, TokenSource::emulator(), None)?));
    }

    let json = args.service_account_json.as_deref().ok_or(ConfigError::Missing("FIREBASE_SERVICE_ACCOUNT_JSON"))?;
    let key = ServiceAccountKey::from_json(json)?;
    let project_id = args.project_id.clone().unwrap_or_else(|| key.project_id.clone());
    let config = FirestoreConfig::new(project_id)?
        .database(args.database.as_str())
        .collection(args.collection.as_str())
        .timeout(timeout);
    Ok(Arc::new(FirestoreCorpus::new(config, TokenSource::service_account(key), None)?))
}

/// Stand-in for a collaborator whose configuration failed. Every call fails with a
/// configuration error naming the component and the reason.
#[derive(Debug, Clone)]
pub struct Unavailable {
    component: &'static str,
    reason: String,
}

impl Unavailable {
    pub fn new(component: &'static str, reason: impl Into<String>) -> Self {
        Self { component, reason: reason.into() }
    }

    fn message(&self) -> String {
        format!("{} is unavailable: {}", self.component, self.reason)
    }
}

#[async_trait]
impl Embedder for Unavailable {
    async fn embed(&self, _texts: &[&str], _task: EmbeddingTask) -> Result<Vec<Embedding>, EmbeddingError> {
        Err(EmbeddingError::Configuration(self.message()))
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
impl CorpusReader for Unavailable {
    async fn fetch_all(&self) -> Result<Vec<CorpusEntry>, CorpusError> {
        Err(CorpusError::Configuration(self.message()))
    }

    fn source(&self) -> &str {
        "unavailable"
    }
}

#[async_trait]
impl ChatModel for Unavailable {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        Err(ChatError::Configuration(self.message()))
    }

    fn model_id(&self) -> &str {
        "unavailable"
    }
}
