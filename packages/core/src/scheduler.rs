//! Detector refresh scheduler.
//!
//! Drives the background loop: wait, run one refresh cycle, repeat. The first
//! wait is shortened (possibly to zero) based on when the store was last
//! written, so a restart does not postpone an overdue refresh by a full
//! interval. Every later wait is the full interval.
//!
//! Errors from a cycle are logged and the loop continues; a single failed
//! refresh should never take down the scheduler.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::RefreshError;
use crate::provider::DynamicDetectors;
use crate::store::RuleStore;

/// Time to wait before the first refresh after startup.
///
/// Zero when the next refresh (`last_updated + interval`) is already due.
pub fn initial_delay(last_updated: DateTime<Utc>, interval: Duration, now: DateTime<Utc>) -> Duration {
    let Ok(step) = chrono::Duration::from_std(interval) else {
        return interval;
    };
    let Some(next_run) = last_updated.checked_add_signed(step) else {
        return interval;
    };
    (next_run - now).to_std().unwrap_or(Duration::ZERO)
}

/// Run the refresh loop until `shutdown` is cancelled.
///
/// Reads the last update time once on entry; if that fails the loop does
/// not start and the error is returned. Cancellation is only observed
/// between cycles, an in-flight cycle always runs to completion.
pub async fn run_refresh_loop(
    detectors: &DynamicDetectors,
    shutdown: &CancellationToken,
) -> Result<(), RefreshError> {
    let interval = detectors.refresh_interval();

    let last_updated = detectors
        .store()
        .get_last_updated()
        .await
        .map_err(RefreshError::LastUpdated)?;

    let mut wait = initial_delay(last_updated, interval, Utc::now());

    tracing::info!(
        source = detectors.source_name(),
        interval_secs = interval.as_secs(),
        first_run_in_secs = wait.as_secs(),
        "Detector refresh started"
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                tracing::info!("Shutdown signal received. Stopping detector refresh.");
                return Err(RefreshError::Cancelled);
            }

            _ = time::sleep(wait) => {
                refresh_once(detectors).await;
                wait = interval;
            }
        }
    }
}

/// Execute a single refresh cycle and report its outcome.
async fn refresh_once(detectors: &DynamicDetectors) {
    let started = Instant::now();
    tracing::debug!("Updating detection rules");

    let result = detectors.update_detectors().await;
    let elapsed = started.elapsed();

    match &result {
        Ok(count) => tracing::info!(
            detectors = count,
            duration_ms = elapsed.as_millis() as u64,
            "Detection rules update finished"
        ),
        Err(err) => tracing::error!(
            error = %err,
            duration_ms = elapsed.as_millis() as u64,
            "Error while updating detectors"
        ),
    }

    if let Some(metrics) = detectors.metrics() {
        metrics.observe_refresh(&result, elapsed);
    }
}
