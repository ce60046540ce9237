use std::{net::SocketAddr, path::PathBuf, time::Duration};

use askplot_core::pipeline::DEFAULT_TOP_K;
use askplot_extensions::firestore::DEFAULT_COLLECTION;
use askplot_extensions::gemini::{DEFAULT_GEMINI_CHAT_MODEL, DEFAULT_GEMINI_EMBEDDING_MODEL, GenerationSettings};
use clap::{Args, Parser};

/// Askplot: answer questions about stored plot summaries.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "ASKPLOT_BIND", default_value = "0.0.0.0:8888")]
    pub bind: SocketAddr,

    /// Number of passages handed to the model as reference information.
    #[arg(long, env = "ASKPLOT_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Timeout in seconds for each call to Gemini or Firestore.
    #[arg(long, env = "ASKPLOT_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Replace the persona line at the top of the prompt.
    #[arg(long, env = "ASKPLOT_PERSONA")]
    pub persona: Option<String>,

    #[command(flatten)]
    pub gemini: GeminiArgs,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "ASKPLOT_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Args, Clone, Default)]
pub struct GeminiArgs {
    /// Gemini API key.
    #[arg(long = "gemini-api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the Generative Language API endpoint.
    #[arg(long = "gemini-base-url", env = "GEMINI_BASE_URL")]
    pub base_url: Option<String>,

    /// Model used to embed questions.
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_GEMINI_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Model used to write answers.
    #[arg(long, env = "CHAT_MODEL", default_value = DEFAULT_GEMINI_CHAT_MODEL)]
    pub chat_model: String,

    /// Sampling temperature for answers (model default when unset).
    #[arg(long, env = "GEMINI_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Upper bound on the length of an answer, in tokens.
    #[arg(long, env = "GEMINI_MAX_OUTPUT_TOKENS")]
    pub max_output_tokens: Option<u32>,
}

impl GeminiArgs {
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

impl Cli {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Args, Clone, Default)]
pub struct CorpusArgs {
    /// Serve the corpus from a JSON file instead of Firestore. Takes precedence over the
    /// Firestore settings.
    #[arg(long, env = "ASKPLOT_CORPUS_FILE")]
    pub corpus_file: Option<PathBuf>,

    /// Service account key document used to read Firestore.
    #[arg(long = "firebase-service-account-json", env = "FIREBASE_SERVICE_ACCOUNT_JSON", hide_env_values = true)]
    pub service_account_json: Option<String>,

    /// Firestore project (defaults to the service account's project).
    #[arg(long = "firestore-project-id", env = "FIRESTORE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Firestore database id.
    #[arg(long = "firestore-database", env = "FIRESTORE_DATABASE", default_value = "(default)")]
    pub database: String,

    /// Collection holding the precomputed passage embeddings.
    #[arg(long = "firestore-collection", env = "FIRESTORE_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// `host:port` of a local Firestore emulator.
    #[arg(long = "firestore-emulator-host", env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,
}
