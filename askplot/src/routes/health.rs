use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

/// Liveness check. Does not touch the external services.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "askplot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
