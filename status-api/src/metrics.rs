use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref STATUS_CREATED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "status_created_total",
        "Total device status records created"
    ))
    .expect("valid metric options");
    pub static ref VALIDATION_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "status_validation_failures_total",
        "Total requests rejected by payload validation"
    ))
    .expect("valid metric options");
    pub static ref NOT_FOUND_TOTAL: Counter = Counter::with_opts(Opts::new(
        "status_not_found_total",
        "Total lookups for devices without any status record"
    ))
    .expect("valid metric options");
    pub static ref DB_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "status_db_failures_total",
        "Total requests failed by a storage error"
    ))
    .expect("valid metric options");
    pub static ref AUTH_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "status_auth_failures_total",
        "Total requests rejected for a missing or invalid API key"
    ))
    .expect("valid metric options");
    pub static ref QUERY_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "status_query_latency_seconds",
            "Time taken by a single database operation"
        )
        .buckets(vec![
            0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0
        ])
    )
    .expect("valid metric options");
}

pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(STATUS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VALIDATION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NOT_FOUND_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DB_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(AUTH_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(QUERY_LATENCY_SECONDS.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    // The text encoder only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_registered_metrics() {
        // Registration is process-wide; a second call from another test is allowed to fail.
        let _ = init_metrics();
        STATUS_CREATED_TOTAL.inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("status_created_total"));
        assert!(text.contains("status_query_latency_seconds"));
    }
}
