use once_cell::sync::Lazy;
use prometheus::{opts, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Registry, TextEncoder};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}

const LATENCY_BUCKETS: [f64; 14] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "path", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method", "path"]);

// ── Intake ──────────────────────────────────────────────────────────────────
pub static PUT_OUTCOMES: Lazy<IntCounterVec> =
    counter_vec!("put_outcomes_total", "Outcomes of POST /put", &["outcome"]);

/// Outcome label values of `put_outcomes_total`.
pub mod outcome {
    pub const ACCEPTED: &str = "accepted";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const TOO_LARGE: &str = "too_large";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const LABEL_ACTOR_FAILED: &str = "label_actor_failed";
    pub const DATA_ACTOR_FAILED: &str = "data_actor_failed";
}

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(PUT_OUTCOMES.clone()))?;
    Ok(())
}

/// A registry under the `librarian` namespace with every metric registered.
pub fn registry() -> prometheus::Result<Registry> {
    let registry = Registry::new_custom(Some("librarian".into()), None)?;
    register_all(&registry)?;
    Ok(registry)
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_http(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn observe_put(outcome: &str) {
    PUT_OUTCOMES.with_label_values(&[outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_prefixed() {
        let registry = registry().unwrap();
        observe_put(outcome::ACCEPTED);
        observe_http("POST", "/put", 200, 0.01);
        for fam in &registry.gather() {
            assert!(
                fam.get_name().starts_with("librarian_"),
                "metric {} missing prefix",
                fam.get_name()
            );
        }
    }

    #[test]
    fn test_outcomes_are_counted() {
        let registry = Registry::new_custom(Some("test".into()), None).unwrap();
        register_all(&registry).unwrap();
        let before = PUT_OUTCOMES.with_label_values(&[outcome::INVALID_INPUT]).get();
        observe_put(outcome::INVALID_INPUT);
        assert!(PUT_OUTCOMES.with_label_values(&[outcome::INVALID_INPUT]).get() > before);
        assert!(gather_metrics(&registry).contains("test_put_outcomes_total"));
    }
}
