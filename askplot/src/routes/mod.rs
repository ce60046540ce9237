pub mod ask;
pub mod health;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

/// Answer for any method other than POST on `/api/ask`.
pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")], "Method Not Allowed")
}
