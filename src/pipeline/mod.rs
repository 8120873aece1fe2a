// Data materialization pipeline: ingestion, processing, and cache storage

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;

// Re-export the orchestration surface used by the dashboard
pub use orchestrator::{materialize, Materialized, Pipeline, PipelineConfig};
pub use processing::JoinStrategy;
