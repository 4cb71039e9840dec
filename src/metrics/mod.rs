//! Prometheus metrics for the payload simulator.
//!
//! This module provides metrics for monitoring the simulator:
//! - Render metrics (renders by outcome, substitutions by expression kind)
//! - Session metrics (active render sessions)
//! - One-shot publish metrics
//! - Auto-publish metrics (messages published, failures, running jobs)

mod helpers;

pub use helpers::{
    encode_metrics, AutoPublishMetrics, PublishMetrics, SessionMetrics, SimulatorMetrics,
};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "payload_simulator";

lazy_static! {
    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Total template renders by outcome
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total template renders",
        &["outcome"]
    ).unwrap();

    /// Total bracket expressions seen by resolved kind
    pub static ref SUBSTITUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_substitutions_total", METRIC_PREFIX),
        "Total bracket expressions processed",
        &["kind"]
    ).unwrap();

    // ============================================================================
    // Session Metrics
    // ============================================================================

    /// Number of render sessions currently held
    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_sessions_active", METRIC_PREFIX),
        "Number of render sessions currently held"
    ).unwrap();

    // ============================================================================
    // Publish Metrics
    // ============================================================================

    /// One-shot publishes by outcome
    pub static ref PUBLISH_MESSAGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_publish_messages_total", METRIC_PREFIX),
        "Messages published through the one-shot publish endpoint",
        &["outcome"]
    ).unwrap();

    // ============================================================================
    // Auto-publish Metrics
    // ============================================================================

    /// Messages handed to a sink by auto-publish jobs, by outcome
    pub static ref AUTO_PUBLISH_MESSAGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_auto_publish_messages_total", METRIC_PREFIX),
        "Messages published by auto-publish jobs",
        &["outcome"]
    ).unwrap();

    /// Auto-publish jobs currently running
    pub static ref AUTO_PUBLISH_JOBS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_auto_publish_jobs_active", METRIC_PREFIX),
        "Auto-publish jobs currently running"
    ).unwrap();

    /// Time spent rendering and publishing one auto-publish message
    pub static ref AUTO_PUBLISH_DURATION_MS: Histogram = register_histogram!(
        format!("{}_auto_publish_duration_ms", METRIC_PREFIX),
        "Time to render and publish one auto-publish message in milliseconds",
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0]
    ).unwrap();
}
