//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Process-wide metrics registry
pub struct Metrics {
    registry: Registry,

    // Orchestrated actions, labelled by action ("create_bounty" / "submit_label")
    pub actions_started: IntCounterVec,
    pub actions_succeeded: IntCounterVec,
    pub actions_failed: IntCounterVec,

    // Backoff retrier
    pub retry_attempts: IntCounter,
    pub retry_exhausted: IntCounter,
    pub retry_aborted: IntCounter,

    // Classifier, labelled by context and kind
    pub classified_failures: IntCounterVec,

    // Chain client
    pub rpc_requests: IntCounterVec,

    // Histograms
    pub finality_latency: Histogram,
    pub rpc_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let actions_started = IntCounterVec::new(
            Opts::new("datapact_actions_started_total", "User actions started"),
            &["action"],
        )?;

        let actions_succeeded = IntCounterVec::new(
            Opts::new("datapact_actions_succeeded_total", "User actions that reached a successful result"),
            &["action"],
        )?;

        let actions_failed = IntCounterVec::new(
            Opts::new("datapact_actions_failed_total", "User actions that ended in a failure result"),
            &["action"],
        )?;

        let retry_attempts = IntCounter::with_opts(Opts::new(
            "datapact_retry_attempts_total",
            "Operation attempts made by the backoff retrier",
        ))?;

        let retry_exhausted = IntCounter::with_opts(Opts::new(
            "datapact_retry_exhausted_total",
            "Retried operations that used up every attempt",
        ))?;

        let retry_aborted = IntCounter::with_opts(Opts::new(
            "datapact_retry_aborted_total",
            "Retried operations stopped early on a non-retryable failure",
        ))?;

        let classified_failures = IntCounterVec::new(
            Opts::new("datapact_classified_failures_total", "Failures classified by context and kind"),
            &["context", "kind"],
        )?;

        let rpc_requests = IntCounterVec::new(
            Opts::new("datapact_rpc_requests_total", "JSON-RPC requests by method"),
            &["method"],
        )?;

        let finality_latency = Histogram::with_opts(
            HistogramOpts::new("datapact_finality_latency_seconds", "Time from signed digest to parsed result")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        let rpc_latency = Histogram::with_opts(
            HistogramOpts::new("datapact_rpc_latency_seconds", "JSON-RPC call latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(actions_started.clone()))?;
        registry.register(Box::new(actions_succeeded.clone()))?;
        registry.register(Box::new(actions_failed.clone()))?;
        registry.register(Box::new(retry_attempts.clone()))?;
        registry.register(Box::new(retry_exhausted.clone()))?;
        registry.register(Box::new(retry_aborted.clone()))?;
        registry.register(Box::new(classified_failures.clone()))?;
        registry.register(Box::new(rpc_requests.clone()))?;
        registry.register(Box::new(finality_latency.clone()))?;
        registry.register(Box::new(rpc_latency.clone()))?;

        Ok(Self {
            registry,
            actions_started,
            actions_succeeded,
            actions_failed,
            retry_attempts,
            retry_exhausted,
            retry_aborted,
            classified_failures,
            rpc_requests,
            finality_latency,
            rpc_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in Prometheus text exposition format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(|| {
        // Metric names are static, registration cannot collide
        Metrics::new().expect("Failed to initialize metrics")
    });
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let m = metrics();

        let before = m.retry_attempts.get();
        m.retry_attempts.inc();
        assert_eq!(m.retry_attempts.get(), before + 1);

        let counter = m.actions_started.with_label_values(&["create_bounty"]);
        let before = counter.get();
        counter.inc();
        assert_eq!(counter.get(), before + 1);
    }

    #[test]
    fn test_render_contains_registered_names() {
        let m = metrics();
        m.rpc_requests.with_label_values(&["sui_getObject"]).inc();
        m.finality_latency.observe(1.5);

        let text = m.render().unwrap();
        assert!(text.contains("datapact_rpc_requests_total"));
        assert!(text.contains("datapact_finality_latency_seconds"));
    }

    #[test]
    fn test_timer_observes() {
        let m = metrics();
        let before = m.rpc_latency.get_sample_count();
        Timer::new().observe_duration(&m.rpc_latency);
        assert_eq!(m.rpc_latency.get_sample_count(), before + 1);
    }
}
