//! Prometheus metrics definitions for Finsynth
//!
//! All metrics use the `finsynth_` prefix.

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics for the forecasting pipeline
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Forecast requests by intent and final status
    pub forecasts_total: CounterVec,
    /// Time spent inside the projection engine
    pub projection_duration_seconds: HistogramVec,
    /// Report exports by outcome
    pub exports_total: CounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with all counters and histograms registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let forecasts_total = CounterVec::new(
            Opts::new("finsynth_forecasts_total", "Forecast requests by intent and status"),
            &["intent", "status"],
        )?;
        registry.register(Box::new(forecasts_total.clone()))?;

        let projection_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "finsynth_projection_duration_seconds",
                "Projection engine run time in seconds",
            )
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
            &["intent"],
        )?;
        registry.register(Box::new(projection_duration_seconds.clone()))?;

        let exports_total = CounterVec::new(
            Opts::new("finsynth_exports_total", "Report exports by status"),
            &["status"],
        )?;
        registry.register(Box::new(exports_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            forecasts_total,
            projection_duration_seconds,
            exports_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Count a forecast request reaching `status`
    pub fn inc_forecasts(&self, intent: &str, status: &str) {
        self.forecasts_total.with_label_values(&[intent, status]).inc();
    }

    pub fn observe_projection(&self, intent: &str, seconds: f64) {
        self.projection_duration_seconds
            .with_label_values(&[intent])
            .observe(seconds);
    }

    pub fn inc_exports(&self, status: &str) {
        self.exports_total.with_label_values(&[status]).inc();
    }
}
