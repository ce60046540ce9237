use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use tracing::{debug, instrument, trace};
use url::Url;

use super::error::GeminiError;

const DEFAULT_GEMINI_GENERATIVE_LANGUAGE_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for Gemini clients.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// Google AI API key. Sent as the `x-goog-api-key` header, never in a URL.
    pub(crate) api_key: SecretString,
    /// Base URL for the Google AI Generative Language API.
    pub(crate) base_url: Url,
    /// Timeout for HTTP requests. Defaults to 60 seconds.
    pub(crate) timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new Gemini configuration.
    ///
    /// # Errors
    /// Returns `GeminiError::InvalidConfiguration` if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeminiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeminiError::InvalidConfiguration("API key cannot be empty".to_string()));
        }

        let base_url = Url::parse(DEFAULT_GEMINI_GENERATIVE_LANGUAGE_BASE_URL)
            .map_err(|e| GeminiError::InvalidConfiguration(
                format!("Failed to parse default base URL: {}", e)
            ))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            timeout: Duration::from_secs(60),
        })
    }

    /// Allows setting a custom base URL (proxies, test servers).
    pub fn base_url(mut self, url: &str) -> Result<Self, GeminiError> {
        self.base_url = Url::parse(url)
            .map_err(|e| GeminiError::InvalidConfiguration(
                format!("Invalid base URL '{}': {}", url, e)
            ))?;
        Ok(self)
    }

    /// Allows setting a custom request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Shared component holding the HTTP client and configuration for Gemini API access.
#[derive(Clone, Debug)]
pub(crate) struct SharedGeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl SharedGeminiClient {
    /// Builds a default reqwest client if one is not provided.
    #[instrument(name = "shared_gemini_client_new", skip(config, client_override))]
    pub(crate) fn new(config: GeminiConfig, client_override: Option<Client>) -> Result<Self, GeminiError> {
        let client = match client_override {
            Some(client) => {
                debug!("Using provided HTTP client.");
                client
            },
            None => {
                debug!(timeout=?config.timeout, "Building default HTTP client.");
                Client::builder()
                    .timeout(config.timeout)
                    .build()
                    .map_err(|e| GeminiError::InvalidConfiguration(
                        format!("Failed to build default HTTP client: {}", e)
                    ))?
            }
        };

        debug!(base_url = %config.base_url, "Shared Gemini client initialized.");

        Ok(Self { config, http_client: client })
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Builds `{base}/v1beta/{relative_path}`, e.g. for "models/gemini-1.5-flash:generateContent".
    pub(crate) fn build_url(&self, relative_path: &str) -> Result<Url, GeminiError> {
        let base_path = format!("v1beta/{}", relative_path);
        let mut url = self.config.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| GeminiError::InvalidConfiguration("Base URL cannot be a 'cannot-be-a-base' URL.".to_string()))?
            .pop_if_empty()
            .extend(base_path.split('/'));

        trace!(built_url = %url, "Built Gemini API URL");
        Ok(url)
    }
}
