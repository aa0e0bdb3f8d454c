use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Liveness probe. Never cached by intermediaries.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        "ok",
    )
}
