use std::{
    fmt,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use super::error::{error_message, FirestoreError};

/// OAuth scope granting read/write access to Firestore.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The parts of a Google service account JSON key needed to mint access tokens.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key_id: Option<String>,
    pub token_uri: String,
    private_key: SecretString,
}

/// On-the-wire shape of the key document; other fields (`type`, `client_id`, ...) are ignored.
#[derive(Deserialize)]
struct ServiceAccountJson {
    project_id: String,
    client_email: String,
    #[serde(default)]
    private_key_id: Option<String>,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Parses the JSON key document (the content of `FIREBASE_SERVICE_ACCOUNT_JSON`).
    pub fn from_json(json: &str) -> Result<Self, FirestoreError> {
        let raw: ServiceAccountJson = serde_json::from_str(json)
            .map_err(|e| FirestoreError::InvalidServiceAccount(e.to_string()))?;
        if raw.project_id.is_empty() || raw.client_email.is_empty() {
            return Err(FirestoreError::InvalidServiceAccount(
                "project_id and client_email must not be empty".to_string(),
            ));
        }
        if raw.private_key.trim().is_empty() {
            return Err(FirestoreError::InvalidServiceAccount("private_key must not be empty".to_string()));
        }
        Ok(Self {
            project_id: raw.project_id,
            client_email: raw.client_email,
            private_key_id: raw.private_key_id,
            token_uri: raw.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            private_key: SecretString::from(raw.private_key),
        })
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

/// Produces the bearer token attached to Firestore requests.
pub struct TokenSource {
    kind: TokenKind,
}

enum TokenKind {
    /// Mints and caches OAuth access tokens from a service account key.
    ServiceAccount {
        key: ServiceAccountKey,
        cached: Mutex<Option<CachedToken>>,
    },
    /// The local emulator accepts a fixed token.
    Emulator,
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::ServiceAccount { key, .. } => f.debug_tuple("ServiceAccount").field(&key.client_email).finish(),
            TokenKind::Emulator => f.write_str("Emulator"),
        }
    }
}

impl TokenSource {
    pub fn service_account(key: ServiceAccountKey) -> Self {
        Self { kind: TokenKind::ServiceAccount { key, cached: Mutex::new(None) } }
    }

    pub fn emulator() -> Self {
        Self { kind: TokenKind::Emulator }
    }

    /// Returns a valid bearer token, exchanging a fresh signed assertion when the cached token is
    /// missing or about to expire.
    #[instrument(skip(self, http_client))]
    pub(crate) async fn bearer_token(&self, http_client: &Client) -> Result<SecretString, FirestoreError> {
        let (key, cached) = match &self.kind {
            TokenKind::Emulator => return Ok(SecretString::from("owner")),
            TokenKind::ServiceAccount { key, cached } => (key, cached),
        };

        let mut cached = cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.token.clone());
            }
            debug!("Cached access token expired, refreshing.");
        }

        let fresh = exchange_token(key, http_client).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

fn signed_assertion(key: &ServiceAccountKey, now: SystemTime) -> Result<String, FirestoreError> {
    let iat = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let claims = Claims {
        iss: &key.client_email,
        scope: DATASTORE_SCOPE,
        aud: &key.token_uri,
        iat,
        exp: iat + TOKEN_LIFETIME.as_secs(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
        .map_err(FirestoreError::Signing)?;
    jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(FirestoreError::Signing)
}

async fn exchange_token(key: &ServiceAccountKey, http_client: &Client) -> Result<CachedToken, FirestoreError> {
    let assertion = signed_assertion(key, SystemTime::now())?;
    debug!(client_email = %key.client_email, token_uri = %key.token_uri, "Exchanging service account assertion for access token");

    let response = http_client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    if !response.status().is_success() {
        let (status, message) = error_message(response).await?;
        error!(%status, "Token endpoint rejected the service account assertion");
        return Err(FirestoreError::TokenExchange { status, message });
    }

    let body = response.text().await?;
    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| FirestoreError::ResponseParsing {
            context: "Parsing token response".to_string(),
            source: e,
        })?;

    let lifetime = token.expires_in.map(Duration::from_secs).unwrap_or(TOKEN_LIFETIME);
    Ok(CachedToken {
        token: SecretString::from(token.access_token),
        refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
    })
}
