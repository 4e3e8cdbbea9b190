// Prometheus metrics for the command risk classifier
//
// Exposed on the /metrics HTTP endpoint when enabled:
// - Assessments by risk level (counter)
// - Blocked batches (counter)
// - Rule matches by category (counter)
// - Assessment latency (histogram)

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::safety::{Assessment, RuleCategory};

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    pub static ref ASSESSMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("assessments_total", "Total number of command batches assessed"),
        &["risk_level"]
    ).expect("Failed to create assessments total metric");

    pub static ref BLOCKED_TOTAL: IntCounter = IntCounter::new(
        "blocked_total",
        "Total number of command batches refused by a hard-block rule"
    ).expect("Failed to create blocked total metric");

    pub static ref RULE_MATCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("rule_matches_total", "Total number of rule matches"),
        &["category"]
    ).expect("Failed to create rule matches metric");

    pub static ref ASSESSMENT_DURATION_SECONDS: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "assessment_duration_seconds",
            "Time to assess one command batch"
        )
        .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01]),
    ).expect("Failed to create assessment duration metric");
}

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Register all metrics with the registry
///
/// Safe to call more than once; registration happens on the first call and
/// every call reports its outcome.
pub fn init() -> prometheus::Result<()> {
    init_once(&INIT, register_all)
}

fn init_once<F>(cell: &OnceLock<Result<(), String>>, register: F) -> prometheus::Result<()>
where
    F: FnOnce() -> prometheus::Result<()>,
{
    cell.get_or_init(|| register().map_err(|e| e.to_string()))
        .clone()
        .map_err(prometheus::Error::Msg)
}

fn register_all() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(ASSESSMENTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BLOCKED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RULE_MATCHES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ASSESSMENT_DURATION_SECONDS.clone()))?;
    Ok(())
}

/// Record the outcome of one assessment
pub fn record_assessment(assessment: &Assessment, elapsed: Duration) {
    ASSESSMENTS_TOTAL
        .with_label_values(&[assessment.risk_level.as_str()])
        .inc();
    if assessment.blocked {
        BLOCKED_TOTAL.inc();
    }
    ASSESSMENT_DURATION_SECONDS.observe(elapsed.as_secs_f64());
}

/// Record a single rule match
pub fn record_rule_match(category: RuleCategory) {
    RULE_MATCHES_TOTAL
        .with_label_values(&[category.as_str()])
        .inc();
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
