use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::metrics::RefreshMetrics;
use crate::provider::DynamicDetectors;

/// Shared state type for the status routes.
pub type StatusState = Arc<StatusApiState>;

pub struct StatusApiState {
    pub detectors: Arc<DynamicDetectors>,
    pub metrics: Arc<RefreshMetrics>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectorsSummary {
    pub enabled: bool,
    pub count: usize,
}

pub async fn detectors(State(state): State<StatusState>) -> Json<DetectorsSummary> {
    let snapshot = state.detectors.provide_detectors().await;
    Json(DetectorsSummary {
        enabled: state.detectors.is_enabled(),
        count: snapshot.len(),
    })
}

pub async fn metrics(State(state): State<StatusState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to render metrics" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::api::create_status_router;
    use crate::config::FeatureToggles;
    use crate::provider::DYNAMIC_DETECTION_FLAG;
    use crate::services::mock::MockRuleSource;
    use crate::store::MemoryRuleStore;

    const STORED_RULES: &str = r#"[
        {"name":"a","type":"contains","pattern":"a"},
        {"name":"b","type":"regex","pattern":"b+"},
        {"name":"c","type":"future","pattern":"c"}
    ]"#;

    async fn make_state(features: FeatureToggles) -> StatusState {
        let store = Arc::new(MemoryRuleStore::with_value(STORED_RULES, Utc::now()));
        let detectors = DynamicDetectors::new(
            Arc::new(MockRuleSource::new()),
            store,
            &features,
            Duration::from_secs(3600),
        )
        .await;

        Arc::new(StatusApiState {
            detectors: Arc::new(detectors),
            metrics: Arc::new(RefreshMetrics::new().unwrap()),
        })
    }

    async fn get(state: StatusState, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = create_status_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let state = make_state(FeatureToggles::default()).await;
        let (status, body) = get(state, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn detectors_reports_restored_count() {
        let state = make_state(FeatureToggles::default().with(DYNAMIC_DETECTION_FLAG)).await;
        let (status, body) = get(state, "/detectors").await;

        assert_eq!(status, StatusCode::OK);
        let summary: DetectorsSummary = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary, DetectorsSummary { enabled: true, count: 2 });
    }

    #[tokio::test]
    async fn detectors_reports_disabled_subsystem() {
        let state = make_state(FeatureToggles::default()).await;
        let (_, body) = get(state, "/detectors").await;

        let summary: DetectorsSummary = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary, DetectorsSummary { enabled: false, count: 0 });
    }

    #[tokio::test]
    async fn metrics_renders_prometheus_text() {
        let state = make_state(FeatureToggles::default()).await;
        state.metrics.refresh_total.inc();

        let (status, body) = get(state, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("detector_cache_refresh_total 1"));
    }
}
