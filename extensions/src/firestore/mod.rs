//! Firestore-backed corpus: reads every document of one collection through the REST API.

mod auth;
mod corpus;
mod error;
mod value;

pub use auth::{ServiceAccountKey, TokenSource, DATASTORE_SCOPE};
pub use corpus::{FirestoreConfig, FirestoreCorpus, DEFAULT_COLLECTION};
pub use error::FirestoreError;
