//! Prometheus metrics for the refresh loop.
//!
//! [`RefreshMetrics`] owns its [`Registry`]. Construct it once at startup,
//! wrap it in `Arc`, hand it to [`crate::provider::DynamicDetectors`] and the
//! status router, which renders it at `GET /metrics`.

use std::time::Duration;

use prometheus::{Counter, Gauge, Opts, Registry};

use crate::error::RefreshError;

pub struct RefreshMetrics {
    /// Refresh cycles attempted (success + failure).
    pub refresh_total: Counter,
    /// Refresh cycles that failed.
    pub refresh_errors_total: Counter,
    /// Detectors in the current snapshot.
    pub detectors_loaded: Gauge,
    /// Wall time of the most recent refresh cycle.
    pub last_refresh_duration: Gauge,
    pub registry: Registry,
}

impl RefreshMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let refresh_total = Counter::with_opts(Opts::new(
            "detector_cache_refresh_total",
            "Refresh cycles attempted",
        ))?;

        let refresh_errors_total = Counter::with_opts(Opts::new(
            "detector_cache_refresh_errors_total",
            "Refresh cycles that failed",
        ))?;

        let detectors_loaded = Gauge::with_opts(Opts::new(
            "detector_cache_detectors_loaded",
            "Detectors in the current snapshot",
        ))?;

        let last_refresh_duration = Gauge::with_opts(Opts::new(
            "detector_cache_last_refresh_duration_seconds",
            "Duration of the most recent refresh cycle in seconds",
        ))?;

        registry.register(Box::new(refresh_total.clone()))?;
        registry.register(Box::new(refresh_errors_total.clone()))?;
        registry.register(Box::new(detectors_loaded.clone()))?;
        registry.register(Box::new(last_refresh_duration.clone()))?;

        Ok(Self {
            refresh_total,
            refresh_errors_total,
            detectors_loaded,
            last_refresh_duration,
            registry,
        })
    }

    /// Record the outcome of one refresh cycle.
    pub fn observe_refresh(&self, result: &Result<usize, RefreshError>, elapsed: Duration) {
        self.refresh_total.inc();
        self.last_refresh_duration.set(elapsed.as_secs_f64());
        match result {
            Ok(count) => self.detectors_loaded.set(*count as f64),
            Err(_) => self.refresh_errors_total.inc(),
        }
    }

    /// Render all metrics as Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
