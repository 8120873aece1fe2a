//! Ingestion Phase Metrics
//!
//! Catalog and score-table loading: rows accepted, rows rejected by reason,
//! and derived column collisions.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the ingestion phase
pub struct IngestionMetrics;

impl IngestionMetrics {
    pub fn record_catalog_rows(rows: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "ingestion", "catalog_rows")).set(rows as f64);
    }

    pub fn record_row_rejected(reason: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "ingestion", "rows_rejected"), "reason" => reason)
            .increment(1);
    }

    pub fn record_score_table(scored_titles: usize) {
        ::metrics::counter!(phase_metric!(counter, "ingestion", "score_tables")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "ingestion", "score_table_titles"))
            .record(scored_titles as f64);
    }

    pub fn record_column_collision() {
        ::metrics::counter!(phase_metric!(counter, "ingestion", "column_collisions")).increment(1);
    }
}

impl PhaseMetrics for IngestionMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = gauge!(phase_metric!(gauge, "ingestion", "catalog_rows"));
        let _ = counter!(phase_metric!(counter, "ingestion", "rows_rejected"));
        let _ = counter!(phase_metric!(counter, "ingestion", "score_tables"));
        let _ = counter!(phase_metric!(counter, "ingestion", "column_collisions"));
        let _ = histogram!(phase_metric!(histogram, "ingestion", "score_table_titles"));
    }

    fn phase_name() -> &'static str {
        "ingestion"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(gauge, "ingestion", "catalog_rows"),
                metric_type: MetricType::Gauge,
                help: "Catalog rows accepted by the last load",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "rows_rejected"),
                metric_type: MetricType::Counter,
                help: "Rows rejected while loading, labelled by reason",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "score_tables"),
                metric_type: MetricType::Counter,
                help: "Per-issue score tables loaded",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "column_collisions"),
                metric_type: MetricType::Counter,
                help: "Score tables skipped because their column name was taken",
            },
            MetricDoc {
                name: phase_metric!(histogram, "ingestion", "score_table_titles"),
                metric_type: MetricType::Histogram,
                help: "Distinct titles per loaded score table",
            },
        ]
    }
}
