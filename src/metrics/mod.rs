//! Metrics for the materialization pipeline
//!
//! Each pipeline phase defines its own metrics in a dedicated submodule so
//! naming stays consistent and conflicts surface at registration time.
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed (see [`init_metrics`]).

pub mod cache;
pub mod derivation;
pub mod ingestion;
pub mod pipeline;
pub mod registry;

pub use cache::CacheMetrics;
pub use derivation::DerivationMetrics;
pub use ingestion::IngestionMetrics;
pub use pipeline::PipelineMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install an in-process Prometheus recorder and register all phase metrics.
///
/// Idempotent. Returns `false` if a recorder could not be installed.
pub fn init_metrics() -> bool {
    if HANDLE.get().is_some() {
        return true;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            registry::register_all_metrics();
            info!("Prometheus recorder installed");
            true
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            false
        }
    }
}

/// Prometheus text exposition of everything recorded so far.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Trait for phase-specific metrics collections
///
/// Each pipeline phase implements this trait to provide:
/// - Metric registration at startup
/// - Consistent naming conventions
/// - Documentation of what each metric measures
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    /// Get the phase name for prefixing metrics
    fn phase_name() -> &'static str;

    /// Get documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Macro to create phase-specific metric names with consistent naming
///
/// Convention: kiddos_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("kiddos_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("kiddos_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("kiddos_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
