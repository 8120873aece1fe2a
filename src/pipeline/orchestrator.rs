use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span, warn};

use crate::constants::*;
use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::pipeline::ingestion::{
    freshness_key, load_catalog, load_issue_matching, load_score_tables, FreshnessKey,
};
use crate::pipeline::processing::{
    derive_table, join_issue_matching, join_issue_scores, JoinStrategy, JoinedTable,
};
use crate::pipeline::storage::{CacheId, CacheStore, FsCacheStore};
use crate::types::Table;

/// Inputs and switches for one pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_root: PathBuf,
    pub catalog_file: String,
    pub score_dir: String,
    pub issue_matching_file: String,
    /// File extensions whose mtimes feed the freshness key.
    pub key_extensions: Vec<String>,
    pub join_strategy: JoinStrategy,
}

impl PipelineConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            catalog_file: CATALOG_FILE.to_string(),
            score_dir: SCORE_DIR.to_string(),
            issue_matching_file: ISSUE_MATCHING_FILE.to_string(),
            key_extensions: DEFAULT_KEY_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            join_strategy: JoinStrategy::default(),
        }
    }

    pub fn with_join_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.join_strategy = strategy;
        self
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_root.join(&self.catalog_file)
    }

    pub fn score_dir_path(&self) -> PathBuf {
        self.data_root.join(&self.score_dir)
    }

    pub fn issue_matching_path(&self) -> PathBuf {
        self.data_root.join(&self.issue_matching_file)
    }
}

/// Result of a materialization run.
#[derive(Debug, Clone)]
pub struct Materialized {
    pub table: Table,
    pub key: FreshnessKey,
    pub location: PathBuf,
    pub from_cache: bool,
}

/// Load → join → derive, fronted by a freshness-keyed cache.
pub struct Pipeline<S: CacheStore = FsCacheStore> {
    config: PipelineConfig,
    store: S,
}

impl Pipeline<FsCacheStore> {
    /// Pipeline caching next to its inputs under the data root.
    pub fn new(config: PipelineConfig) -> Self {
        let store = FsCacheStore::new(config.data_root.clone());
        Self { config, store }
    }
}

impl<S: CacheStore> Pipeline<S> {
    pub fn with_store(config: PipelineConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn freshness_key(&self) -> Result<FreshnessKey> {
        freshness_key(&self.config.data_root, &self.config.key_extensions)
    }

    fn join(&self) -> Result<JoinedTable> {
        let catalog = load_catalog(&self.config.catalog_path())?;
        let joined = match self.config.join_strategy {
            JoinStrategy::PerIssueFiles => {
                let tables = load_score_tables(&self.config.score_dir_path())?;
                join_issue_scores(catalog, &tables)
            }
            JoinStrategy::IssueMatching => {
                let matches = load_issue_matching(&self.config.issue_matching_path())?;
                join_issue_matching(catalog, &matches)
            }
        };
        Ok(joined)
    }

    /// Run the uncached load → join → derive sequence.
    pub fn build(&self) -> Result<Table> {
        let started = Instant::now();
        let table = derive_table(self.join()?);
        PipelineMetrics::record_build(started.elapsed().as_secs_f64(), table.len());
        Ok(table)
    }

    /// Return the analytic table for the current inputs, from cache when
    /// allowed and present, otherwise rebuilt and written back.
    ///
    /// If the rebuilt table cannot be persisted the error is
    /// [`PipelineError::CacheWrite`], which still carries the table.
    pub fn materialize(&self, stem: &str, allow_cache: bool) -> Result<Materialized> {
        let span = info_span!("materialize", stem, allow_cache);
        let _enter = span.enter();

        let key = self.freshness_key()?;
        let id = CacheId::new(stem, key.clone(), self.config.join_strategy);
        let location = self.store.location(&id);

        if let Some(table) = self.store.load(&id, allow_cache)? {
            info!(key = %key, rows = table.len(), "Cache hit");
            return Ok(Materialized {
                table,
                key,
                location,
                from_cache: true,
            });
        }

        info!(key = %key, path = %location.display(), "Data has changed, regenerating table");
        let evicted = self.store.evict_obsolete(stem, &location);
        if evicted > 0 {
            info!(evicted, "Evicted obsolete cache artifacts");
        }

        let table = self.build()?;
        let location = match self.store.save(&id, &table) {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %location.display(), error = %e, "Cache was not updated");
                return Err(PipelineError::CacheWrite {
                    path: location,
                    source: Box::new(e),
                    table: Box::new(table),
                });
            }
        };

        Ok(Materialized {
            table,
            key,
            location,
            from_cache: false,
        })
    }
}

/// Materialize `stem` for the data under `data_root` with default settings.
pub fn materialize(data_root: &Path, stem: &str, allow_cache: bool) -> Result<Materialized> {
    Pipeline::new(PipelineConfig::new(data_root)).materialize(stem, allow_cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::storage::InMemoryCacheStore;
    use std::fs;
    use tempfile::tempdir;

    struct RejectingStore;

    impl CacheStore for RejectingStore {
        fn location(&self, id: &CacheId) -> PathBuf {
            PathBuf::from(id.file_name())
        }

        fn load(&self, _: &CacheId, _: bool) -> Result<Option<Table>> {
            Ok(None)
        }

        fn save(&self, _: &CacheId, _: &Table) -> Result<PathBuf> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn evict_obsolete(&self, _: &str, _: &Path) -> usize {
            0
        }
    }

    fn seed(root: &Path) {
        fs::write(
            root.join(CATALOG_FILE),
            "imdb_id\ttitle\tshort_desc\trelease_year\thbogo_url\tmovie_trailer_url\tage_child\tposter\tscores\n\
             tt0000001\tMoana\tOcean voyage\t2016\t\t\tage 7+\tm.jpg\t{'Violence': '2', 'Positive Messages': '5'}\n\
             tt0000002\tCoco\tMusic and family\t2017\t\t\t\tc.jpg\t{}\n",
        )
        .unwrap();
        fs::create_dir_all(root.join(SCORE_DIR)).unwrap();
        fs::write(
            root.join(SCORE_DIR).join("Immigration.csv"),
            "imdb_id,inf_dist_summary\ntt0000002,0.3\n",
        )
        .unwrap();
    }

    #[test]
    fn test_materialize_with_in_memory_store() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let pipeline = Pipeline::with_store(PipelineConfig::new(dir.path()), InMemoryCacheStore::new());

        let first = pipeline.materialize(DEFAULT_STEM, true).unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.table.len(), 2);
        assert_eq!(pipeline.store().len(), 1);

        let second = pipeline.materialize(DEFAULT_STEM, true).unwrap();
        assert!(second.from_cache);
        assert_eq!(first.table, second.table);

        let forced = pipeline.materialize(DEFAULT_STEM, false).unwrap();
        assert!(!forced.from_cache);
    }

    #[test]
    fn test_cache_write_failure_still_returns_table() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let pipeline = Pipeline::with_store(PipelineConfig::new(dir.path()), RejectingStore);

        let err = pipeline.materialize(DEFAULT_STEM, true).unwrap_err();
        assert!(matches!(err, PipelineError::CacheWrite { .. }));
        let table = err.into_table().expect("table travels with the error");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::with_store(PipelineConfig::new(dir.path()), InMemoryCacheStore::new());
        assert!(matches!(
            pipeline.materialize(DEFAULT_STEM, true),
            Err(PipelineError::Io(_))
        ));
    }

    #[test]
    fn test_issue_matching_strategy() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        fs::write(
            dir.path().join(ISSUE_MATCHING_FILE),
            "imdb_id,social_issue,match_score\ntt0000001,Climate Change,0.7\n",
        )
        .unwrap();
        let config = PipelineConfig::new(dir.path()).with_join_strategy(JoinStrategy::IssueMatching);
        let table = Pipeline::with_store(config, InMemoryCacheStore::new()).build().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].social_issue.as_deref(), Some("Climate Change"));
        assert!(table.issue_columns.is_empty());
    }
}
