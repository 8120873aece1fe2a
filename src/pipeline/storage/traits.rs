use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::CACHE_EXTENSION;
use crate::error::Result;
use crate::pipeline::ingestion::FreshnessKey;
use crate::pipeline::processing::JoinStrategy;
use crate::types::Table;

/// Identity of one cached table: the same inputs joined with a different
/// strategy are a different entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheId {
    pub stem: String,
    pub key: FreshnessKey,
    pub strategy: JoinStrategy,
}

impl CacheId {
    pub fn new(stem: impl Into<String>, key: FreshnessKey, strategy: JoinStrategy) -> Self {
        Self {
            stem: stem.into(),
            key,
            strategy,
        }
    }

    /// `{stem}.{key}.bin`, or `{stem}.{tag}.{key}.bin` for non-default strategies.
    pub fn file_name(&self) -> String {
        match self.strategy.cache_tag() {
            Some(tag) => format!("{}.{}.{}.{}", self.stem, tag, self.key, CACHE_EXTENSION),
            None => format!("{}.{}.{}", self.stem, self.key, CACHE_EXTENSION),
        }
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Storage trait for materialized tables, addressed by [`CacheId`]
pub trait CacheStore: Send + Sync {
    /// Where the entry for `id` lives (or would live).
    fn location(&self, id: &CacheId) -> PathBuf;

    /// Fetch a cached table. `allow_cache = false` always reports a miss.
    fn load(&self, id: &CacheId, allow_cache: bool) -> Result<Option<Table>>;

    /// Persist a table under `id`, returning its location.
    fn save(&self, id: &CacheId, table: &Table) -> Result<PathBuf>;

    /// Best-effort removal of superseded artifacts for `stem`. Never removes
    /// `keep`. Returns how many artifacts were removed.
    fn evict_obsolete(&self, stem: &str, keep: &Path) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::freshness_key;
    use tempfile::tempdir;

    #[test]
    fn test_file_name_carries_non_default_strategy() {
        let dir = tempdir().unwrap();
        let key = freshness_key(dir.path(), &["csv".to_string()]).unwrap();

        let per_issue = CacheId::new("data_bundle", key.clone(), JoinStrategy::PerIssueFiles);
        assert_eq!(per_issue.file_name(), format!("data_bundle.{}.bin", key));

        let matching = CacheId::new("data_bundle", key.clone(), JoinStrategy::IssueMatching);
        assert_eq!(
            matching.file_name(),
            format!("data_bundle.issue_matching.{}.bin", key)
        );
    }
}
