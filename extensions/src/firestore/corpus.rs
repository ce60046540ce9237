use std::time::Duration;

use askplot_core::corpus::{CorpusEntry, CorpusError, CorpusReader};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::{debug, error, info, instrument, trace};
use url::Url;

use super::{
    auth::TokenSource,
    error::{error_message, FirestoreError},
    value::ListDocumentsResponse,
};

const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_COLLECTION: &str = "plot_vectors";
// Maximum page size accepted by ListDocuments.
const DEFAULT_PAGE_SIZE: u32 = 300;

/// Where the corpus lives and how to reach it.
#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub(crate) project_id: String,
    pub(crate) database: String,
    pub(crate) collection: String,
    pub(crate) base_url: Url,
    pub(crate) page_size: u32,
    pub(crate) timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Result<Self, FirestoreError> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(FirestoreError::InvalidConfiguration("Project id cannot be empty".to_string()));
        }
        let base_url = Url::parse(DEFAULT_FIRESTORE_BASE_URL)
            .map_err(|e| FirestoreError::InvalidConfiguration(format!("Failed to parse default base URL: {}", e)))?;

        Ok(Self {
            project_id,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            base_url,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(60),
        })
    }

    #[must_use]
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Overrides the API endpoint, e.g. `http://localhost:8080` for the emulator.
    pub fn base_url(mut self, url: &str) -> Result<Self, FirestoreError> {
        self.base_url = Url::parse(url)
            .map_err(|e| FirestoreError::InvalidConfiguration(format!("Invalid base URL '{}': {}", url, e)))?;
        Ok(self)
    }

    /// Points the client at a `FIRESTORE_EMULATOR_HOST` style `host:port`.
    pub fn emulator_host(self, host: &str) -> Result<Self, FirestoreError> {
        self.base_url(&format!("http://{}", host))
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Reads the whole corpus collection through Firestore's REST `ListDocuments` endpoint.
///
/// Documents are expected to carry a string field `text` and an `embedding` field holding either
/// an array of numbers or a Firestore vector.
#[derive(Debug)]
pub struct FirestoreCorpus {
    config: FirestoreConfig,
    tokens: TokenSource,
    http_client: Client,
    source: String,
}

impl FirestoreCorpus {
    pub fn new(config: FirestoreConfig, tokens: TokenSource, client_override: Option<Client>) -> Result<Self, FirestoreError> {
        let http_client = match client_override {
            Some(client) => client,
            None => Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| FirestoreError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e)))?,
        };
        let source = format!("firestore:{}/{}", config.project_id, config.collection);
        debug!(%source, tokens = ?tokens, base_url = %config.base_url, "Firestore corpus reader initialized.");

        Ok(Self { config, tokens, http_client, source })
    }

    /// `{base}/v1/projects/{project}/databases/{database}/documents/{collection}`
    fn documents_url(&self) -> Result<Url, FirestoreError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FirestoreError::InvalidConfiguration("Base URL cannot be a 'cannot-be-a-base' URL.".to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                &self.config.project_id,
                "databases",
                &self.config.database,
                "documents",
                &self.config.collection,
            ]);
        Ok(url)
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<ListDocumentsResponse, FirestoreError> {
        let mut url = self.documents_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &self.config.page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        trace!(%url, "Requesting Firestore documents page");

        let token = self.tokens.bearer_token(&self.http_client).await?;
        let response = self.http_client
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = error_message(response).await?;
            error!(%status, %message, "Firestore ListDocuments returned error status");
            return Err(FirestoreError::ApiError { status, message });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(parse_error = %e, "Failed to parse Firestore ListDocuments response");
            FirestoreError::ResponseParsing {
                context: "Parsing ListDocuments response".to_string(),
                source: e,
            }
        })
    }

    async fn fetch_all_inner(&self) -> Result<Vec<CorpusEntry>, FirestoreError> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            pages += 1;
            for document in page.documents {
                entries.push(document.into_corpus_entry()?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(count = entries.len(), pages, source = %self.source, "Fetched Firestore corpus");
        Ok(entries)
    }
}

#[async_trait]
impl CorpusReader for FirestoreCorpus {
    #[instrument(skip(self), fields(source = %self.source))]
    async fn fetch_all(&self) -> Result<Vec<CorpusEntry>, CorpusError> {
        self.fetch_all_inner().await.map_err(Into::into)
    }

    fn source(&self) -> &str {
        &self.source
    }
}
