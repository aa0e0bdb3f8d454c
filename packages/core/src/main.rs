use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;

use detector_cache::api::{create_status_router, StatusApiState};
use detector_cache::cli::Cli;
use detector_cache::config::Config;
use detector_cache::db::create_pool;
use detector_cache::error::{AppError, RefreshError};
use detector_cache::logging::init_logging;
use detector_cache::metrics::RefreshMetrics;
use detector_cache::provider::DynamicDetectors;
use detector_cache::repository::SqliteRuleStore;
use detector_cache::rules::detect_any;
use detector_cache::services::{HttpClientConfig, RulesApiClient};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(&cli).map_err(AppError::Config)?;
    tracing::info!(
        base_url = %config.rules_base_url,
        database_url = %config.database_url,
        interval_secs = config.refresh_interval.as_secs(),
        "Service starting"
    );

    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(SqliteRuleStore::new(pool));

    let http_config = HttpClientConfig {
        timeout: config.http_timeout,
        ..HttpClientConfig::default()
    };
    let source = Arc::new(RulesApiClient::new(config.rules_base_url.clone(), &http_config)?);

    let metrics = Arc::new(RefreshMetrics::new()?);
    let detectors = Arc::new(
        DynamicDetectors::new(source, store, &config.features, config.refresh_interval)
            .await
            .with_metrics(metrics.clone()),
    );

    if let Some(path) = &cli.scan {
        if detectors.is_disabled() {
            detectors.set_detectors_from_store().await?;
        }
        let content = tokio::fs::read(path).await?;
        let snapshot = detectors.provide_detectors().await;
        let matched = detect_any(&snapshot, &content);
        println!(
            "{}: {} ({} detectors)",
            path.display(),
            if matched { "match" } else { "no match" },
            snapshot.len()
        );
        return Ok(());
    }

    if cli.once {
        let count = detectors.update_detectors().await?;
        tracing::info!(detectors = count, "Single refresh completed");
        return Ok(());
    }

    metrics
        .detectors_loaded
        .set(detectors.provide_detectors().await.len() as f64);

    let shutdown = CancellationToken::new();

    if detectors.is_enabled() {
        let detectors = detectors.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match detectors.run(shutdown).await {
                Err(RefreshError::Cancelled) | Ok(()) => {
                    tracing::info!("Detector refresh stopped cleanly")
                }
                Err(err) => tracing::error!("Detector refresh stopped: {}", err),
            }
        });
    } else {
        tracing::info!("Dynamic detection disabled; background refresh not started");
    }

    let app = create_status_router(Arc::new(StatusApiState {
        detectors,
        metrics,
    }));
    let listener = tokio::net::TcpListener::bind(config.status_addr).await?;
    tracing::info!(addr = %config.status_addr, "Status server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Service stopped");
    Ok(())
}

/// Resolves on Ctrl+C and cancels `shutdown` so the refresh loop stops too.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
