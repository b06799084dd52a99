//! Observability hooks.
//!
//! With the `metrics` feature a process-wide [`METRICS`] registry records
//! query, pool and request figures through OpenTelemetry and exposes them in
//! Prometheus text format (`GET /metrics`). With the `tracing` feature the
//! [`tracing_helpers`] module provides the spans entered around queries,
//! transactions, connection checkout and HTTP requests.

#[cfg(feature = "metrics")]
pub use prom::{CatalogMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prom {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    pub static METRICS: Lazy<CatalogMetrics> = Lazy::new(CatalogMetrics::init);

    pub struct CatalogMetrics {
        registry: Registry,
        _provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub connection_wait_duration: Histogram<f64>,
        pub pool_timeouts_total: Counter<u64>,
        pub http_requests_total: Counter<u64>,
        pub http_request_duration: Histogram<f64>,
        pub pool_in_use: Arc<AtomicUsize>,
    }

    impl CatalogMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let provider = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
                Err(e) => {
                    log::error!("failed to build prometheus exporter, metrics disabled: {}", e);
                    SdkMeterProvider::builder().build()
                }
            };
            let meter = provider.meter("catalog");

            let queries_total = meter
                .u64_counter("catalog_db_queries_total")
                .with_description("Total queries executed")
                .build();

            let query_errors_total = meter
                .u64_counter("catalog_db_query_errors_total")
                .with_description("Queries that returned an error")
                .build();

            let query_duration = meter
                .f64_histogram("catalog_db_query_duration_seconds")
                .with_description("Duration of queries")
                .build();

            let connection_wait_duration = meter
                .f64_histogram("catalog_db_connection_wait_seconds")
                .with_description("Time spent waiting for a pooled connection")
                .build();

            let pool_timeouts_total = meter
                .u64_counter("catalog_db_pool_timeouts_total")
                .with_description("Checkouts that gave up after the pool timeout")
                .build();

            let http_requests_total = meter
                .u64_counter("catalog_http_requests_total")
                .with_description("HTTP requests served")
                .build();

            let http_request_duration = meter
                .f64_histogram("catalog_http_request_duration_seconds")
                .with_description("HTTP request latency")
                .build();

            let pool_in_use = Arc::new(AtomicUsize::new(0));
            let in_use = Arc::clone(&pool_in_use);

            let _gauge = meter
                .u64_observable_gauge("catalog_db_pool_in_use")
                .with_description("Connections currently checked out of the pool")
                .with_callback(move |observer| {
                    observer.observe(in_use.load(Ordering::Relaxed) as u64, &[]);
                })
                .build();

            Self {
                registry,
                _provider: provider,
                queries_total,
                query_errors_total,
                query_duration,
                connection_wait_duration,
                pool_timeouts_total,
                http_requests_total,
                http_request_duration,
                pool_in_use,
            }
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_connection_wait(&self, elapsed: Duration) {
            self.connection_wait_duration
                .record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_pool_timeout(&self) {
            self.pool_timeouts_total.add(1, &[]);
        }

        pub fn connection_checked_out(&self) {
            self.pool_in_use.fetch_add(1, Ordering::Relaxed);
        }

        pub fn connection_returned(&self) {
            self.pool_in_use.fetch_sub(1, Ordering::Relaxed);
        }

        pub fn record_http_request(&self, method: &str, status: usize, elapsed: Duration) {
            let attrs = [
                KeyValue::new("method", method.to_string()),
                KeyValue::new("status", status as i64),
            ];
            self.http_requests_total.add(1, &attrs);
            self.http_request_duration
                .record(elapsed.as_secs_f64(), &attrs);
        }

        /// Render every registered metric in Prometheus text format.
        pub fn render(&self) -> Result<String, String> {
            let encoder = TextEncoder::new();
            let families = self.registry.gather();
            let mut buffer = Vec::new();
            encoder
                .encode(&families, &mut buffer)
                .map_err(|e| format!("failed to encode metrics: {e}"))?;
            String::from_utf8(buffer).map_err(|e| format!("metrics are not utf-8: {e}"))
        }
    }
}

/// Span constructors used behind `#[cfg(feature = "tracing")]`.
#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn execute_query_span(query: &str) -> Span {
        info_span!("db.query", db.system = "postgresql", db.statement = %query)
    }

    pub fn acquire_connection_span() -> Span {
        info_span!("db.connection.acquire", db.system = "postgresql")
    }

    pub fn begin_transaction_span() -> Span {
        info_span!("db.transaction.begin")
    }

    pub fn commit_transaction_span() -> Span {
        info_span!("db.transaction.commit")
    }

    pub fn rollback_transaction_span() -> Span {
        info_span!("db.transaction.rollback")
    }

    pub fn http_request_span(method: &str, path: &str, trace_id: &str) -> Span {
        info_span!(
            "http.request",
            http.method = %method,
            http.path = %path,
            trace_id = %trace_id
        )
    }
}
