// Pipeline ingestion: input discovery, freshness keys, and raw table loading

pub mod freshness;
pub mod loader;
pub mod score_blob;
pub mod tabular;

// Re-export key types and functions for external use
pub use freshness::{freshness_key, FreshnessKey};
pub use loader::{load_catalog, load_issue_matching, load_score_tables, CatalogRow, IssueMatch, ScoreTable};
pub use score_blob::decode_scores;
