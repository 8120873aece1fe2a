//! Cache Phase Metrics
//!
//! Hits, misses, writes and evictions of materialized tables.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the cache store
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit(bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "cache", "hits")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "cache", "read_bytes")).record(bytes as f64);
    }

    pub fn record_miss() {
        ::metrics::counter!(phase_metric!(counter, "cache", "misses")).increment(1);
    }

    pub fn record_write(bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "cache", "writes")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "cache", "write_bytes")).record(bytes as f64);
    }

    pub fn record_write_error() {
        ::metrics::counter!(phase_metric!(counter, "cache", "write_errors")).increment(1);
    }

    pub fn record_evicted(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "cache", "evictions")).increment(count as u64);
    }
}

impl PhaseMetrics for CacheMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "cache", "hits"));
        let _ = counter!(phase_metric!(counter, "cache", "misses"));
        let _ = counter!(phase_metric!(counter, "cache", "writes"));
        let _ = counter!(phase_metric!(counter, "cache", "write_errors"));
        let _ = counter!(phase_metric!(counter, "cache", "evictions"));
        let _ = histogram!(phase_metric!(histogram, "cache", "read_bytes"));
        let _ = histogram!(phase_metric!(histogram, "cache", "write_bytes"));
    }

    fn phase_name() -> &'static str {
        "cache"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "cache", "hits"),
                metric_type: MetricType::Counter,
                help: "Materializations served from a cache file",
            },
            MetricDoc {
                name: phase_metric!(counter, "cache", "misses"),
                metric_type: MetricType::Counter,
                help: "Cache lookups that required a rebuild",
            },
            MetricDoc {
                name: phase_metric!(counter, "cache", "writes"),
                metric_type: MetricType::Counter,
                help: "Cache files written",
            },
            MetricDoc {
                name: phase_metric!(counter, "cache", "write_errors"),
                metric_type: MetricType::Counter,
                help: "Cache writes that failed",
            },
            MetricDoc {
                name: phase_metric!(counter, "cache", "evictions"),
                metric_type: MetricType::Counter,
                help: "Legacy cache artifacts removed",
            },
            MetricDoc {
                name: phase_metric!(histogram, "cache", "read_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of cache files read",
            },
            MetricDoc {
                name: phase_metric!(histogram, "cache", "write_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of cache files written",
            },
        ]
    }
}
