//! Derivation Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the derivation phase
pub struct DerivationMetrics;

impl DerivationMetrics {
    pub fn record_row_dropped(reason: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "derivation", "rows_dropped"), "reason" => reason)
            .increment(1);
    }

    pub fn record_rows_derived(rows: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "derivation", "rows_out")).set(rows as f64);
    }
}

impl PhaseMetrics for DerivationMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = counter!(phase_metric!(counter, "derivation", "rows_dropped"));
        let _ = gauge!(phase_metric!(gauge, "derivation", "rows_out"));
    }

    fn phase_name() -> &'static str {
        "derivation"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "derivation", "rows_dropped"),
                metric_type: MetricType::Counter,
                help: "Joined rows dropped during derivation, labelled by reason",
            },
            MetricDoc {
                name: phase_metric!(gauge, "derivation", "rows_out"),
                metric_type: MetricType::Gauge,
                help: "Rows in the last derived table",
            },
        ]
    }
}
