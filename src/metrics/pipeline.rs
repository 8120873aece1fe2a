//! Pipeline Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for full rebuilds
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_build(duration_secs: f64, rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "builds")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "build_duration_seconds"))
            .record(duration_secs);
        ::metrics::gauge!(phase_metric!(gauge, "pipeline", "table_rows")).set(rows as f64);
    }
}

impl PhaseMetrics for PipelineMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = counter!(phase_metric!(counter, "pipeline", "builds"));
        let _ = histogram!(phase_metric!(histogram, "pipeline", "build_duration_seconds"));
        let _ = gauge!(phase_metric!(gauge, "pipeline", "table_rows"));
    }

    fn phase_name() -> &'static str {
        "pipeline"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "builds"),
                metric_type: MetricType::Counter,
                help: "Uncached load, join and derive runs",
            },
            MetricDoc {
                name: phase_metric!(histogram, "pipeline", "build_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of uncached builds",
            },
            MetricDoc {
                name: phase_metric!(gauge, "pipeline", "table_rows"),
                metric_type: MetricType::Gauge,
                help: "Rows in the last built table",
            },
        ]
    }
}
