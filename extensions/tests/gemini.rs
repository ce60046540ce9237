mod common;

use askplot_core::chat::{ChatError, ChatModel};
use askplot_core::embedding::{Embedder, EmbeddingError, EmbeddingTask};
use askplot_extensions::gemini::{GeminiClient, GeminiConfig, GenerationSettings};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use common::{get_api_key_or_skip, setup_tracing};

const EMBED_PATH: &str = "/v1beta/models/text-embedding-004:batchEmbedContents";
const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn client_for(server: &ServerGuard) -> GeminiClient {
    let config = GeminiConfig::new("test-key")
        .unwrap()
        .base_url(&server.url())
        .unwrap();
    GeminiClient::from_config(config, None).unwrap()
}

#[tokio::test]
async fn embeds_query_with_retrieval_task_type() {
    setup_tracing();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EMBED_PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "requests": [{
                "model": "models/text-embedding-004",
                "content": { "parts": [{ "text": "Who betrays the captain?" }] },
                "taskType": "RETRIEVAL_QUERY"
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"embeddings": [{"values": [0.1, 0.2, 0.3]}]}"#)
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let embedding = embedder
        .embed_one("Who betrays the captain?", EmbeddingTask::RetrievalQuery)
        .await
        .unwrap();

    assert_eq!(embedding.as_slice(), &[0.1, 0.2, 0.3]);
    assert_eq!(embedder.model_name(), "text-embedding-004");
    assert_eq!(embedder.dimensions(), Some(768));
    mock.assert_async().await;
}

#[tokio::test]
async fn document_task_type_is_sent_for_documents() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EMBED_PATH)
        .match_body(Matcher::PartialJson(json!({
            "requests": [
                { "taskType": "RETRIEVAL_DOCUMENT" },
                { "taskType": "RETRIEVAL_DOCUMENT" }
            ]
        })))
        .with_status(200)
        .with_body(r#"{"embeddings": [{"values": [1.0]}, {"values": [2.0]}]}"#)
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let embeddings = embedder
        .embed(&["chapter one", "chapter two"], EmbeddingTask::RetrievalDocument)
        .await
        .unwrap();

    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[1].as_slice(), &[2.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_input_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", EMBED_PATH).expect(0).create_async().await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let embeddings = embedder.embed(&[], EmbeddingTask::RetrievalQuery).await.unwrap();

    assert!(embeddings.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_key_maps_to_authentication_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(403)
        .with_body(r#"{"error": {"code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED"}}"#)
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let err = embedder.embed_one("q", EmbeddingTask::RetrievalQuery).await.unwrap_err();

    match err {
        EmbeddingError::Authentication(message) => {
            assert!(message.contains("API key not valid."));
            assert!(!message.contains("test-key"));
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn quota_exhaustion_maps_to_rate_limited() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(429)
        .with_body(r#"{"error": {"code": 429, "message": "Resource exhausted.", "status": "RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let err = embedder.embed_one("q", EmbeddingTask::RetrievalQuery).await.unwrap_err();

    assert!(matches!(err, EmbeddingError::RateLimited));
}

#[tokio::test]
async fn server_error_keeps_status_and_raw_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let err = embedder.embed_one("q", EmbeddingTask::RetrievalQuery).await.unwrap_err();

    match err {
        EmbeddingError::Api { status, message } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn embedding_count_mismatch_is_unexpected_response() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(200)
        .with_body(r#"{"embeddings": []}"#)
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-004").unwrap();
    let err = embedder.embed_one("q", EmbeddingTask::RetrievalQuery).await.unwrap_err();

    assert!(matches!(err, EmbeddingError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn generates_answer_from_prompt() {
    setup_tracing();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Explain chapter 3." }] }]
        })))
        .with_status(200)
        .with_body(
            r#"{
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Chapter 3 " }, { "text": "is the turning point." }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10 }
            }"#,
        )
        .create_async()
        .await;

    let chat = client_for(&server).chat("gemini-1.5-flash").unwrap();
    let answer = chat.generate("Explain chapter 3.").await.unwrap();

    assert_eq!(answer, "Chapter 3 is the turning point.");
    assert_eq!(chat.model_id(), "gemini-1.5-flash");
    mock.assert_async().await;
}

#[tokio::test]
async fn generation_settings_are_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": { "maxOutputTokens": 256, "candidateCount": 1 }
        })))
        .with_status(200)
        .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "ok"}]}, "finishReason": "STOP"}]}"#)
        .create_async()
        .await;

    let chat = client_for(&server)
        .chat("gemini-1.5-flash")
        .unwrap()
        .with_settings(GenerationSettings { temperature: None, max_output_tokens: Some(256) });

    assert_eq!(chat.generate("hi").await.unwrap(), "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn blocked_prompt_maps_to_content_blocked() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let chat = client_for(&server).chat("gemini-1.5-flash").unwrap();
    let err = chat.generate("something unsafe").await.unwrap_err();

    assert!(matches!(err, ChatError::ContentBlocked(reason) if reason.contains("SAFETY")));
}

#[tokio::test]
async fn unknown_model_maps_to_model_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-0.1-imaginary:generateContent")
        .with_status(404)
        .with_body(r#"{"error": {"code": 404, "message": "models/gemini-0.1-imaginary is not found", "status": "NOT_FOUND"}}"#)
        .create_async()
        .await;

    let chat = client_for(&server).chat("gemini-0.1-imaginary").unwrap();
    let err = chat.generate("hi").await.unwrap_err();

    assert!(matches!(err, ChatError::ModelNotFound(_)));
}

#[tokio::test]
async fn test_gemini_live_embed_and_generate() {
    let Some(api_key) = get_api_key_or_skip("GEMINI_API_KEY", "test_gemini_live_embed_and_generate") else {
        return;
    };
    setup_tracing();

    let client = GeminiClient::new(api_key).unwrap();
    let embedder = client.embedder("text-embedding-004").unwrap();
    let embedding = embedder
        .embed_one("A detective investigates a lighthouse.", EmbeddingTask::RetrievalQuery)
        .await
        .unwrap();
    assert_eq!(embedding.dimensions(), 768);

    let chat = client.chat("gemini-1.5-flash").unwrap();
    let reply = chat.generate("Reply with the single word: ready").await.unwrap();
    assert!(!reply.trim().is_empty());
}
