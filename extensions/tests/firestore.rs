mod common;

use askplot_core::corpus::{CorpusError, CorpusReader};
use askplot_extensions::firestore::{
    FirestoreConfig, FirestoreCorpus, ServiceAccountKey, TokenSource, DEFAULT_COLLECTION,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use common::setup_tracing;

const DOCUMENTS_PATH: &str = "/v1/projects/plot-demo/databases/(default)/documents/plot_vectors";
// Throwaway key generated for these tests only.
const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test-service-account.pem");

fn emulator_corpus(server: &ServerGuard) -> FirestoreCorpus {
    let config = FirestoreConfig::new("plot-demo")
        .unwrap()
        .base_url(&server.url())
        .unwrap();
    FirestoreCorpus::new(config, TokenSource::emulator(), None).unwrap()
}

fn document(id: &str, text: &str, embedding: &[f64]) -> serde_json::Value {
    let values: Vec<_> = embedding.iter().map(|v| json!({ "doubleValue": v })).collect();
    json!({
        "name": format!("projects/plot-demo/databases/(default)/documents/plot_vectors/{}", id),
        "fields": {
            "text": { "stringValue": text },
            "embedding": { "arrayValue": { "values": values } }
        },
        "createTime": "2024-05-01T10:00:00.000000Z",
        "updateTime": "2024-05-01T10:00:00.000000Z"
    })
}

#[tokio::test]
async fn fetches_every_page_of_the_collection() {
    setup_tracing();
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", DOCUMENTS_PATH)
        .match_header("authorization", "Bearer owner")
        .match_query(Matcher::Regex("^pageSize=300$".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "documents": [
                    document("ch1", "The crew sets sail.", &[1.0, 0.0]),
                    document("ch2", "A storm hits the ship.", &[0.5, 0.5]),
                ],
                "nextPageToken": "page two"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", DOCUMENTS_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pageSize".to_string(), "300".to_string()),
            Matcher::UrlEncoded("pageToken".to_string(), "page two".to_string()),
        ]))
        .with_status(200)
        .with_body(json!({ "documents": [document("ch3", "The captain is betrayed.", &[0.0, 1.0])] }).to_string())
        .create_async()
        .await;

    let corpus = emulator_corpus(&server);
    let entries = corpus.fetch_all().await.unwrap();

    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["ch1", "ch2", "ch3"]);
    assert_eq!(entries[2].text, "The captain is betrayed.");
    assert_eq!(entries[1].embedding.as_slice(), &[0.5, 0.5]);
    assert_eq!(corpus.source(), "firestore:plot-demo/plot_vectors");
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn empty_collection_yields_no_entries() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DOCUMENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let entries = emulator_corpus(&server).fetch_all().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn custom_collection_and_vector_fields_are_supported() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/projects/plot-demo/databases/(default)/documents/synopses")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "documents": [{
                    "name": "projects/plot-demo/databases/(default)/documents/synopses/vol1",
                    "fields": {
                        "text": { "stringValue": "Volume one synopsis." },
                        "embedding": { "mapValue": { "fields": {
                            "__type__": { "stringValue": "__vector__" },
                            "value": { "arrayValue": { "values": [
                                { "doubleValue": 0.25 },
                                { "integerValue": "1" }
                            ] } }
                        } } }
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = FirestoreConfig::new("plot-demo")
        .unwrap()
        .collection("synopses")
        .base_url(&server.url())
        .unwrap();
    let corpus = FirestoreCorpus::new(config, TokenSource::emulator(), None).unwrap();
    let entries = corpus.fetch_all().await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "vol1");
    assert_eq!(entries[0].embedding.as_slice(), &[0.25, 1.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn unavailable_store_maps_to_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DOCUMENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body(r#"{"error": {"code": 503, "message": "The service is currently unavailable.", "status": "UNAVAILABLE"}}"#)
        .create_async()
        .await;

    let err = emulator_corpus(&server).fetch_all().await.unwrap_err();
    match err {
        CorpusError::Api { status, message } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "The service is currently unavailable.");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn permission_denied_maps_to_authentication_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DOCUMENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}}"#)
        .create_async()
        .await;

    let err = emulator_corpus(&server).fetch_all().await.unwrap_err();
    assert!(matches!(err, CorpusError::Authentication(message) if message.contains("insufficient permissions")));
}

#[tokio::test]
async fn document_without_embedding_is_malformed() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DOCUMENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "documents": [{
                    "name": "projects/plot-demo/databases/(default)/documents/plot_vectors/draft",
                    "fields": { "text": { "stringValue": "No vector yet." } }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = emulator_corpus(&server).fetch_all().await.unwrap_err();
    assert!(matches!(err, CorpusError::MalformedDocument { ref id, .. } if id == "draft"));
}

#[tokio::test]
async fn service_account_token_is_exchanged_once_and_cached() {
    setup_tracing();
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".to_string(),
            "urn:ietf:params:oauth:grant-type:jwt-bearer".to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"access_token": "ya29.test-token", "expires_in": 3599, "token_type": "Bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let documents = server
        .mock("GET", DOCUMENTS_PATH)
        .match_header("authorization", "Bearer ya29.test-token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "documents": [document("ch1", "The crew sets sail.", &[1.0])] }).to_string())
        .expect(2)
        .create_async()
        .await;

    let key_json = json!({
        "type": "service_account",
        "project_id": "plot-demo",
        "private_key_id": "test-key-id",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": "reader@plot-demo.iam.gserviceaccount.com",
        "token_uri": format!("{}/token", server.url())
    })
    .to_string();
    let key = ServiceAccountKey::from_json(&key_json).unwrap();
    let config = FirestoreConfig::new(key.project_id.clone())
        .unwrap()
        .base_url(&server.url())
        .unwrap();
    let corpus = FirestoreCorpus::new(config, TokenSource::service_account(key), None).unwrap();

    assert_eq!(corpus.fetch_all().await.unwrap().len(), 1);
    assert_eq!(corpus.fetch_all().await.unwrap().len(), 1);
    token.assert_async().await;
    documents.assert_async().await;
}

#[tokio::test]
async fn rejected_assertion_maps_to_authentication_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#)
        .create_async()
        .await;
    let documents = server.mock("GET", DOCUMENTS_PATH).match_query(Matcher::Any).expect(0).create_async().await;

    let key_json = json!({
        "project_id": "plot-demo",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": "reader@plot-demo.iam.gserviceaccount.com",
        "token_uri": format!("{}/token", server.url())
    })
    .to_string();
    let key = ServiceAccountKey::from_json(&key_json).unwrap();
    let config = FirestoreConfig::new("plot-demo").unwrap().base_url(&server.url()).unwrap();
    let corpus = FirestoreCorpus::new(config, TokenSource::service_account(key), None).unwrap();

    let err = corpus.fetch_all().await.unwrap_err();
    assert!(matches!(err, CorpusError::Authentication(_)));
    assert!(!err.to_string().contains("BEGIN PRIVATE KEY"));
    documents.assert_async().await;
}

#[test]
fn default_collection_is_plot_vectors() {
    assert_eq!(DEFAULT_COLLECTION, "plot_vectors");
}
