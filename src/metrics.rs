//! Prometheus counters for the HTTP surface and the recommendation engine.

use std::time::Instant;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use serde::Serialize;

/// Per-instance registry; handlers hold it through `AppState`
pub struct ServiceMetrics {
    registry: Registry,
    started_at: Instant,

    pub requests_total: IntCounterVec,
    pub request_errors_total: IntCounter,
    pub request_duration: HistogramVec,
    pub recommendations_total: IntCounterVec,
}

/// JSON summary served on `/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub requests_processed: u64,
    pub request_errors: u64,
    pub success_rate: f64,
    pub average_response_time_ms: f64,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests by method and status class"),
            &["method", "status"],
        )?;
        let request_errors_total = IntCounter::new("http_request_errors_total", "Responses with status >= 500")?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "Request latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["method"],
        )?;
        let recommendations_total = IntCounterVec::new(
            Opts::new("recommendations_total", "Recommendations served by model and source"),
            &["model", "source"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_errors_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(recommendations_total.clone()))?;

        Ok(Self {
            registry,
            started_at: Instant::now(),
            requests_total,
            request_errors_total,
            request_duration,
            recommendations_total,
        })
    }

    pub fn record_request(&self, method: &str, status: u16, elapsed_seconds: f64) {
        let class = format!("{}xx", status / 100);
        self.requests_total.with_label_values(&[method, &class]).inc();
        self.request_duration.with_label_values(&[method]).observe(elapsed_seconds);
        if status >= 500 {
            self.request_errors_total.inc();
        }
    }

    pub fn record_recommendation(&self, model: &str, is_fallback: bool) {
        let source = if is_fallback { "fallback" } else { "model" };
        self.recommendations_total.with_label_values(&[model, source]).inc();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let families = self.registry.gather();
        let requests: u64 = families
            .iter()
            .filter(|f| f.get_name() == "http_requests_total")
            .flat_map(|f| f.get_metric())
            .map(|m| m.get_counter().get_value() as u64)
            .sum();
        let (latency_sum, latency_count) = families
            .iter()
            .filter(|f| f.get_name() == "http_request_duration_seconds")
            .flat_map(|f| f.get_metric())
            .fold((0.0, 0u64), |(sum, count), m| {
                let h = m.get_histogram();
                (sum + h.get_sample_sum(), count + h.get_sample_count())
            });
        let errors = self.request_errors_total.get();

        MetricsSnapshot {
            uptime_seconds: self.started_at.elapsed().as_secs(),
            requests_processed: requests,
            request_errors: errors,
            success_rate: if requests == 0 { 100.0 } else { 100.0 * (requests - errors.min(requests)) as f64 / requests as f64 },
            average_response_time_ms: if latency_count == 0 { 0.0 } else { latency_sum * 1000.0 / latency_count as f64 },
        }
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
