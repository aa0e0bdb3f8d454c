//! Status HTTP endpoints
//!
//! A small read-only surface next to the refresh loop: liveness, Prometheus
//! metrics and a summary of the loaded detectors.

pub mod health;
pub mod status;

use axum::{routing::get, Router};

pub use status::{StatusApiState, StatusState};

/// Create the status router
pub fn create_status_router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(status::metrics))
        .route("/detectors", get(status::detectors))
        .with_state(state)
}
