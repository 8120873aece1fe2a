// Pipeline processing: joining issue scores and deriving analytic columns

pub mod derive;
pub mod joiner;
pub mod naming;

// Re-export key types and functions
pub use derive::derive_table;
pub use joiner::{join_issue_matching, join_issue_scores, JoinStrategy, JoinedTable};
pub use naming::issue_column;
