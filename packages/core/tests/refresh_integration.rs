//! End-to-end tests for the detector refresh path.
//!
//! Each test wires the real pieces together: a wiremocked rules API, the
//! reqwest-backed `RulesApiClient`, an in-memory SQLite `SqliteRuleStore` and
//! `DynamicDetectors` on top. No live rules service is needed.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use detector_cache::{
    api::{create_status_router, StatusApiState},
    config::FeatureToggles,
    db::create_pool,
    error::RefreshError,
    metrics::RefreshMetrics,
    provider::{DynamicDetectors, DYNAMIC_DETECTION_FLAG},
    repository::SqliteRuleStore,
    rules::{detect_any, RuleSet},
    services::{FetchError, HttpClientConfig, RulesApiClient},
    store::RuleStore,
};

// ---- Helpers ----------------------------------------------------------------

/// Two rules this build understands plus one it does not.
const RULES_JSON: &str = r#"[
    {"name": "PanelCtrl", "type": "contains", "pattern": "PanelCtrl"},
    {"name": "QueryCtrl", "type": "regex", "pattern": "[\"']QueryCtrl[\"']"},
    {"name": "future", "type": "ast-query", "pattern": "CallExpression"}
]"#;

const RULES_PATH: &str = "/api/plugins/angular_patterns";

fn rules_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(RULES_JSON, "application/json")
}

fn enabled() -> FeatureToggles {
    FeatureToggles::default().with(DYNAMIC_DETECTION_FLAG)
}

async fn build_detectors(
    server: &MockServer,
    pool: &SqlitePool,
    interval: Duration,
) -> Arc<DynamicDetectors> {
    let source = RulesApiClient::new(server.uri(), &HttpClientConfig::default()).unwrap();
    let store = SqliteRuleStore::new(pool.clone());
    Arc::new(DynamicDetectors::new(Arc::new(source), Arc::new(store), &enabled(), interval).await)
}

// ---- Tests ------------------------------------------------------------------

#[tokio::test]
async fn refresh_fetches_persists_and_serves_detectors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(rules_response())
        .expect(1)
        .mount(&server)
        .await;
    let pool = create_pool("sqlite::memory:").await.unwrap();
    let detectors = build_detectors(&server, &pool, Duration::from_secs(3600)).await;

    assert!(detectors.provide_detectors().await.is_empty());
    assert_eq!(detectors.update_detectors().await.unwrap(), 2);

    let snapshot = detectors.provide_detectors().await;
    assert!(detect_any(&snapshot, b"export class Ctrl extends PanelCtrl {}"));
    assert!(detect_any(&snapshot, b"const name = 'QueryCtrl';"));
    assert!(!detect_any(&snapshot, b"export const plugin = new PanelPlugin()"));

    let store = SqliteRuleStore::new(pool.clone());
    let stored: RuleSet = serde_json::from_str(&store.get().await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.len(), 3, "unknown rules are persisted for newer builds");
}

#[tokio::test]
async fn restarted_provider_restores_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(rules_response())
        .expect(1)
        .mount(&server)
        .await;
    let pool = create_pool("sqlite::memory:").await.unwrap();

    let first = build_detectors(&server, &pool, Duration::from_secs(3600)).await;
    first.update_detectors().await.unwrap();
    drop(first);

    let restarted = build_detectors(&server, &pool, Duration::from_secs(3600)).await;
    assert_eq!(restarted.provide_detectors().await.len(), 2);
}

#[tokio::test]
async fn failed_refresh_keeps_store_and_detectors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(rules_response())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("[]"))
        .mount(&server)
        .await;
    let pool = create_pool("sqlite::memory:").await.unwrap();
    let detectors = build_detectors(&server, &pool, Duration::from_secs(3600)).await;
    let store = SqliteRuleStore::new(pool.clone());

    detectors.update_detectors().await.unwrap();
    let before = detectors.provide_detectors().await;
    let updated_at = store.get_last_updated().await.unwrap();

    let err = detectors.update_detectors().await.unwrap_err();

    assert!(matches!(
        err,
        RefreshError::Fetch(FetchError::Status { status: 500 })
    ));
    assert!(Arc::ptr_eq(&before, &detectors.provide_detectors().await));
    assert_eq!(store.get_last_updated().await.unwrap(), updated_at);
}

#[tokio::test]
async fn background_loop_refreshes_overdue_store_and_stops_on_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(rules_response())
        .mount(&server)
        .await;
    let pool = create_pool("sqlite::memory:").await.unwrap();
    let detectors = build_detectors(&server, &pool, Duration::from_secs(3600)).await;
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn({
        let detectors = detectors.clone();
        let shutdown = shutdown.clone();
        async move { detectors.run(shutdown).await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while detectors.provide_detectors().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("never-updated store should trigger an immediate refresh");

    shutdown.cancel();
    let result = handle.await.unwrap();
    assert!(matches!(result, Err(RefreshError::Cancelled)));
}

#[tokio::test]
async fn status_router_reports_loaded_detectors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .respond_with(rules_response())
        .mount(&server)
        .await;
    let pool = create_pool("sqlite::memory:").await.unwrap();
    let detectors = build_detectors(&server, &pool, Duration::from_secs(3600)).await;
    detectors.update_detectors().await.unwrap();

    let app = create_status_router(Arc::new(StatusApiState {
        detectors,
        metrics: Arc::new(RefreshMetrics::new().unwrap()),
    }));

    let response = app
        .oneshot(Request::builder().uri("/detectors").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let summary: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary["enabled"], true);
    assert_eq!(summary["count"], 2);
}
