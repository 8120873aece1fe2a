use std::path::PathBuf;

use thiserror::Error;

use crate::types::Table;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk data root: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Malformed table {path}: {message}")]
    Tabular { path: PathBuf, message: String },

    #[error("Cache encoding failed: {0}")]
    CacheCodec(#[from] bincode::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The table was materialized but could not be persisted. The computed
    /// table travels with the error so callers can still use it.
    #[error("Failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: Box<PipelineError>,
        table: Box<Table>,
    },
}

impl PipelineError {
    pub fn tabular(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Tabular {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Recover the in-memory table from a failed cache write.
    pub fn into_table(self) -> Option<Table> {
        match self {
            PipelineError::CacheWrite { table, .. } => Some(*table),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
