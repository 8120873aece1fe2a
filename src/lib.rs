pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod types;

pub use error::{PipelineError, Result};
pub use pipeline::{materialize, Materialized, Pipeline, PipelineConfig};
pub use types::{Axis, Table, TitleRecord};
