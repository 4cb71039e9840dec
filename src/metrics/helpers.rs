//! Metric recording helpers

use prometheus::{Encoder, TextEncoder};

use super::{
    AUTO_PUBLISH_DURATION_MS, AUTO_PUBLISH_JOBS_ACTIVE, AUTO_PUBLISH_MESSAGES_TOTAL,
    PUBLISH_MESSAGES_TOTAL, RENDERS_TOTAL, SESSIONS_ACTIVE, SUBSTITUTIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording render metrics
pub struct SimulatorMetrics;

impl SimulatorMetrics {
    /// Record one render call (`ok` or `failed`)
    pub fn record_render(outcome: &str) {
        RENDERS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record one bracket expression by the kind that resolved it
    pub fn record_substitution(kind: &str) {
        SUBSTITUTIONS_TOTAL.with_label_values(&[kind]).inc();
    }
}

/// Helper struct for session metrics
pub struct SessionMetrics;

impl SessionMetrics {
    pub fn set_active(count: usize) {
        SESSIONS_ACTIVE.set(count as i64);
    }
}

/// Helper struct for one-shot publish metrics
pub struct PublishMetrics;

impl PublishMetrics {
    /// Record one publish (`published` or `failed`)
    pub fn record(outcome: &str) {
        PUBLISH_MESSAGES_TOTAL.with_label_values(&[outcome]).inc();
    }
}

/// Helper struct for auto-publish metrics
pub struct AutoPublishMetrics;

impl AutoPublishMetrics {
    /// Record a message accepted by the sink
    pub fn record_published(duration_ms: f64) {
        AUTO_PUBLISH_MESSAGES_TOTAL
            .with_label_values(&["published"])
            .inc();
        AUTO_PUBLISH_DURATION_MS.observe(duration_ms);
    }

    /// Record a message the sink refused
    pub fn record_failed() {
        AUTO_PUBLISH_MESSAGES_TOTAL.with_label_values(&["failed"]).inc();
    }

    pub fn set_active_jobs(count: usize) {
        AUTO_PUBLISH_JOBS_ACTIVE.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        SimulatorMetrics::record_render("ok");
        SimulatorMetrics::record_substitution("timestamp");
        AutoPublishMetrics::record_failed();

        let output = encode_metrics().unwrap();
        assert!(output.contains("payload_simulator_renders_total"));
        assert!(output.contains("payload_simulator_substitutions_total"));
        assert!(output.contains("payload_simulator_auto_publish_messages_total"));
    }
}
