//! Observability infrastructure for the optimizer service
//!
//! Provides:
//! - Prometheus metrics (synthesis latency, recommendations, knowledge upserts, chat fallbacks)
//! - Structured JSON logging with tracing

use crate::models::Priority;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for synthesis latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

static GLOBAL_METRICS: OnceLock<OptimizerMetricsInner> = OnceLock::new();

struct OptimizerMetricsInner {
    synthesis_latency_seconds: Histogram,
    synthesis_failures: IntCounter,
    recommendations: IntCounterVec,
    upsert_runs: IntCounter,
    upsert_failures: IntCounter,
    upsert_rows_affected: IntCounter,
    chat_fallbacks: IntCounter,
}

impl OptimizerMetricsInner {
    fn new() -> Self {
        Self {
            synthesis_latency_seconds: register_histogram!(
                "cement_optimizer_synthesis_latency_seconds",
                "Time spent producing a comprehensive prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register synthesis_latency_seconds"),

            synthesis_failures: register_int_counter!(
                "cement_optimizer_synthesis_failures_total",
                "Comprehensive predictions aborted by a provider failure"
            )
            .expect("Failed to register synthesis_failures"),

            recommendations: register_int_counter_vec!(
                "cement_optimizer_recommendations_total",
                "Recommendations emitted, by priority",
                &["priority"]
            )
            .expect("Failed to register recommendations"),

            upsert_runs: register_int_counter!(
                "cement_optimizer_knowledge_upsert_runs_total",
                "Knowledge upsert job invocations"
            )
            .expect("Failed to register upsert_runs"),

            upsert_failures: register_int_counter!(
                "cement_optimizer_knowledge_upsert_failures_total",
                "Knowledge upsert runs that returned an error result"
            )
            .expect("Failed to register upsert_failures"),

            upsert_rows_affected: register_int_counter!(
                "cement_optimizer_knowledge_rows_affected_total",
                "Knowledge rows inserted or updated"
            )
            .expect("Failed to register upsert_rows_affected"),

            chat_fallbacks: register_int_counter!(
                "cement_optimizer_chat_fallbacks_total",
                "Chat replies served by the rule-based responder"
            )
            .expect("Failed to register chat_fallbacks"),
        }
    }
}

/// Handle to the process-wide optimizer metrics.
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct OptimizerMetrics {
    inner: &'static OptimizerMetricsInner,
}

impl Default for OptimizerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerMetrics {
    /// Registers the collectors on first use
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(OptimizerMetricsInner::new),
        }
    }

    pub fn observe_synthesis_latency(&self, duration_secs: f64) {
        self.inner.synthesis_latency_seconds.observe(duration_secs);
    }

    pub fn inc_synthesis_failures(&self) {
        self.inner.synthesis_failures.inc();
    }

    pub fn inc_recommendation(&self, priority: Priority) {
        self.inner
            .recommendations
            .with_label_values(&[&priority.to_string()])
            .inc();
    }

    /// Count one upsert run and its outcome
    pub fn record_upsert(&self, rows_affected: Option<u64>) {
        self.inner.upsert_runs.inc();
        match rows_affected {
            Some(rows) => self.inner.upsert_rows_affected.inc_by(rows),
            None => self.inner.upsert_failures.inc(),
        }
    }

    pub fn inc_chat_fallbacks(&self) {
        self.inner.chat_fallbacks.inc();
    }
}

/// Structured logger for optimizer events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, warehouse: &str, chat_enabled: bool) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            warehouse = %warehouse,
            chat_enabled = chat_enabled,
            "Optimizer API started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Optimizer API shutting down"
        );
    }

    pub fn log_prediction(&self, recommendations: usize, total_savings_per_day: u64, latency_ms: u128) {
        info!(
            event = "prediction_synthesized",
            service = %self.service,
            recommendations = recommendations,
            total_savings_per_day = total_savings_per_day,
            latency_ms = latency_ms as u64,
            "Comprehensive prediction synthesized"
        );
    }

    pub fn log_upsert(&self, table: &str, batch_id: &str, rows_affected: u64) {
        info!(
            event = "knowledge_upserted",
            service = %self.service,
            table = %table,
            batch_id = %batch_id,
            rows_affected = rows_affected,
            "Knowledge chunks upserted"
        );
    }

    pub fn log_upsert_failure(&self, table: &str, error: &str) {
        warn!(
            event = "knowledge_upsert_failed",
            service = %self.service,
            table = %table,
            error = %error,
            "Knowledge upsert failed"
        );
    }

    /// `reason` is absent when no generative backend is configured
    pub fn log_chat_fallback(&self, reason: Option<&str>) {
        match reason {
            Some(reason) => warn!(
                event = "chat_fallback_used",
                service = %self.service,
                reason = %reason,
                "Generative chat failed, answering from rules"
            ),
            None => info!(
                event = "chat_fallback_used",
                service = %self.service,
                "No generative backend configured, answering from rules"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let first = OptimizerMetrics::new();
        let second = OptimizerMetrics::new();

        first.observe_synthesis_latency(0.004);
        first.inc_recommendation(Priority::Urgent);
        second.inc_recommendation(Priority::Urgent);
        second.record_upsert(Some(10));
        second.record_upsert(None);
        first.inc_chat_fallbacks();

        let urgent = first
            .inner
            .recommendations
            .with_label_values(&["urgent"])
            .get();
        assert!(urgent >= 2);
        assert!(second.inner.upsert_runs.get() >= 2);
        assert!(second.inner.upsert_rows_affected.get() >= 10);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("optimizer-api");
        assert_eq!(logger.service, "optimizer-api");
    }
}
