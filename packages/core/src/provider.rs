//! Dynamic detectors provider.
//!
//! [`DynamicDetectors`] ties the pieces together: it fetches rules from a
//! [`RuleSource`], compiles them, persists them to a [`RuleStore`] and swaps
//! the compiled detectors into its [`DetectorCache`]. Callers read detectors
//! through [`DynamicDetectors::provide_detectors`]; the background loop in
//! [`crate::scheduler`] keeps them fresh.
//!
//! A refresh cycle holds the cache's exclusive lock from fetch to swap, so the
//! store and the in-memory snapshot can never disagree. Readers wait for the
//! duration of one cycle in exchange.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::cache::DetectorCache;
use crate::config::FeatureToggles;
use crate::error::RefreshError;
use crate::metrics::RefreshMetrics;
use crate::rules::{compile_rule_set, RuleSet, Snapshot};
use crate::scheduler;
use crate::services::RuleSource;
use crate::store::RuleStore;

/// Feature flag that turns the dynamic detectors subsystem on.
pub const DYNAMIC_DETECTION_FLAG: &str = "dynamicAngularDetectionPatterns";

pub struct DynamicDetectors {
    source: Arc<dyn RuleSource + Send + Sync>,
    store: Arc<dyn RuleStore + Send + Sync>,
    cache: DetectorCache,
    enabled: bool,
    refresh_interval: Duration,
    metrics: Option<Arc<RefreshMetrics>>,
}

impl DynamicDetectors {
    /// Build the provider and, if the feature flag is on, restore detectors
    /// from the store.
    ///
    /// The flag is read here and never again. A failed restore is logged and
    /// leaves the cache empty; it does not fail construction.
    pub async fn new(
        source: Arc<dyn RuleSource + Send + Sync>,
        store: Arc<dyn RuleStore + Send + Sync>,
        features: &FeatureToggles,
        refresh_interval: Duration,
    ) -> Self {
        let provider = Self {
            source,
            store,
            cache: DetectorCache::new(),
            enabled: features.is_enabled(DYNAMIC_DETECTION_FLAG),
            refresh_interval,
            metrics: None,
        };

        if provider.is_disabled() {
            return provider;
        }

        let started = Instant::now();
        tracing::debug!("Restoring detectors from store");
        match provider.set_detectors_from_store().await {
            Ok(Some(count)) => tracing::info!(
                detectors = count,
                duration_ms = started.elapsed().as_millis() as u64,
                "Restored detectors from store"
            ),
            Ok(None) => tracing::debug!("No stored rules to restore"),
            Err(err) => tracing::warn!(error = %err, "Detector restore failed"),
        }
        provider
    }

    pub fn with_metrics(mut self, metrics: Arc<RefreshMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_disabled(&self) -> bool {
        !self.enabled
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    pub(crate) fn store(&self) -> &(dyn RuleStore + Send + Sync) {
        self.store.as_ref()
    }

    pub(crate) fn metrics(&self) -> Option<&RefreshMetrics> {
        self.metrics.as_deref()
    }

    /// Current detectors. Empty until the first successful restore or refresh.
    pub async fn provide_detectors(&self) -> Snapshot {
        self.cache.read().await
    }

    /// Run one refresh cycle: fetch, compile, persist, swap.
    ///
    /// Returns the number of detectors now loaded. On any error the cache is
    /// left exactly as it was, and the store is only written once the rules
    /// are known to compile.
    pub async fn update_detectors(&self) -> Result<usize, RefreshError> {
        let mut writer = self.cache.write().await;

        let rules = self.source.fetch_rules().await?;
        let detectors = compile_rule_set(&rules)?;

        let raw = serde_json::to_string(&rules).map_err(RefreshError::Encode)?;
        self.store.set(&raw).await.map_err(RefreshError::StoreWrite)?;

        let count = detectors.len();
        writer.replace(detectors);
        Ok(count)
    }

    /// Load detectors from the store without touching the network.
    ///
    /// Returns `Ok(None)` when the store holds nothing, leaving the cache as
    /// it is.
    pub async fn set_detectors_from_store(&self) -> Result<Option<usize>, RefreshError> {
        let mut writer = self.cache.write().await;

        let Some(raw) = self.store.get().await.map_err(RefreshError::StoreRead)? else {
            return Ok(None);
        };

        let rules: RuleSet = serde_json::from_str(&raw).map_err(RefreshError::Decode)?;
        let detectors = compile_rule_set(&rules)?;

        let count = detectors.len();
        writer.replace(detectors);
        Ok(Some(count))
    }

    /// Keep detectors fresh until `shutdown` is cancelled.
    ///
    /// Only ever returns an error: [`RefreshError::Cancelled`] on shutdown,
    /// or [`RefreshError::LastUpdated`] if the loop cannot decide when to
    /// start.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), RefreshError> {
        scheduler::run_refresh_loop(self, &shutdown).await
    }
}
