use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::traits::{CacheId, CacheStore};
use crate::constants::{CACHE_FORMAT_VERSION, LEGACY_CACHE_EXTENSION};
use crate::error::Result;
use crate::metrics::CacheMetrics;
use crate::pipeline::processing::JoinStrategy;
use crate::types::Table;

/// On-disk cache entry. Key and join strategy are stored alongside the table
/// so a renamed file cannot masquerade as a fresh one.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    format_version: u32,
    key: String,
    join_strategy: JoinStrategy,
    generated_at: DateTime<Utc>,
    table: Table,
}

/// File-backed cache: [`CacheId::file_name`] under the data root.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn decode(&self, path: &Path, id: &CacheId, bytes: &[u8]) -> Option<Table> {
        let envelope: CacheEnvelope = match bincode::deserialize(bytes) {
            Ok(env) => env,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable cache file, regenerating");
                return None;
            }
        };
        if envelope.format_version != CACHE_FORMAT_VERSION {
            warn!(
                path = %path.display(),
                found = envelope.format_version,
                expected = CACHE_FORMAT_VERSION,
                "Cache format version mismatch, regenerating"
            );
            return None;
        }
        if envelope.key != id.key.as_str() {
            warn!(path = %path.display(), found = %envelope.key, "Cache key mismatch, regenerating");
            return None;
        }
        if envelope.join_strategy != id.strategy {
            warn!(
                path = %path.display(),
                found = ?envelope.join_strategy,
                expected = ?id.strategy,
                "Cache join strategy mismatch, regenerating"
            );
            return None;
        }
        debug!(generated_at = %envelope.generated_at, "Decoded cache entry");
        Some(envelope.table)
    }
}

impl CacheStore for FsCacheStore {
    fn location(&self, id: &CacheId) -> PathBuf {
        self.root.join(id.file_name())
    }

    fn load(&self, id: &CacheId, allow_cache: bool) -> Result<Option<Table>> {
        if !allow_cache {
            debug!(stem = %id.stem, "Cache bypassed by caller");
            CacheMetrics::record_miss();
            return Ok(None);
        }
        let path = self.location(id);
        if !path.is_file() {
            CacheMetrics::record_miss();
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        match self.decode(&path, id, &bytes) {
            Some(table) => {
                info!(path = %path.display(), rows = table.len(), "Loaded cached table");
                CacheMetrics::record_hit(bytes.len());
                Ok(Some(table))
            }
            None => {
                CacheMetrics::record_miss();
                Ok(None)
            }
        }
    }

    fn save(&self, id: &CacheId, table: &Table) -> Result<PathBuf> {
        let path = self.location(id);
        let envelope = CacheEnvelope {
            format_version: CACHE_FORMAT_VERSION,
            key: id.key.to_string(),
            join_strategy: id.strategy,
            generated_at: Utc::now(),
            table: table.clone(),
        };
        let bytes = bincode::serialize(&envelope)?;

        // Write beside the target and rename so readers never see a partial file
        fs::create_dir_all(&self.root)?;
        let tmp = self
            .root
            .join(format!(".{}.tmp-{}", id.file_name(), std::process::id()));
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            CacheMetrics::record_write_error();
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = bytes.len(), "Wrote cache file");
        CacheMetrics::record_write(bytes.len());
        Ok(path)
    }

    fn evict_obsolete(&self, stem: &str, keep: &Path) -> usize {
        let mut removed = 0;
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path == keep {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let legacy = path
                .extension()
                .map_or(false, |ext| ext == LEGACY_CACHE_EXTENSION);
            if !legacy || !name.starts_with(stem) {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => {
                    info!(path = %path.display(), "Removed legacy cache artifact");
                    removed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove legacy cache artifact");
                }
            }
        }
        CacheMetrics::record_evicted(removed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::freshness_key;
    use tempfile::tempdir;

    fn id_for(root: &Path, strategy: JoinStrategy) -> CacheId {
        let key = freshness_key(root, &["csv".to_string()]).unwrap();
        CacheId::new("data_bundle", key, strategy)
    }

    fn sample_table() -> Table {
        Table {
            issue_columns: vec!["score_Bullying".to_string()],
            rows: Vec::new(),
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let id = id_for(dir.path(), JoinStrategy::PerIssueFiles);

        let path = store.save(&id, &sample_table()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("data_bundle.{}.bin", id.key)
        );
        let loaded = store.load(&id, true).unwrap();
        assert_eq!(loaded, Some(sample_table()));
    }

    #[test]
    fn test_disallowed_cache_always_misses() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let id = id_for(dir.path(), JoinStrategy::PerIssueFiles);
        store.save(&id, &sample_table()).unwrap();
        assert_eq!(store.load(&id, false).unwrap(), None);
    }

    #[test]
    fn test_corrupt_cache_is_a_miss() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let id = id_for(dir.path(), JoinStrategy::PerIssueFiles);
        fs::write(store.location(&id), b"not bincode").unwrap();
        assert_eq!(store.load(&id, true).unwrap(), None);
    }

    #[test]
    fn test_strategies_do_not_share_entries() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let per_issue = id_for(dir.path(), JoinStrategy::PerIssueFiles);
        let matching = id_for(dir.path(), JoinStrategy::IssueMatching);

        store.save(&per_issue, &sample_table()).unwrap();
        assert_ne!(store.location(&per_issue), store.location(&matching));
        assert_eq!(store.load(&matching, true).unwrap(), None);
    }

    #[test]
    fn test_renamed_file_with_other_strategy_is_a_miss() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let per_issue = id_for(dir.path(), JoinStrategy::PerIssueFiles);
        let matching = id_for(dir.path(), JoinStrategy::IssueMatching);

        let written = store.save(&per_issue, &sample_table()).unwrap();
        fs::rename(&written, store.location(&matching)).unwrap();
        assert_eq!(store.load(&matching, true).unwrap(), None);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let id = id_for(dir.path(), JoinStrategy::PerIssueFiles);
        store.save(&id, &sample_table()).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec![id.file_name()]);
    }

    #[test]
    fn test_evict_only_touches_legacy_artifacts_for_stem() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let id = id_for(dir.path(), JoinStrategy::PerIssueFiles);
        let current = store.save(&id, &sample_table()).unwrap();

        fs::create_dir_all(dir.path().join("old")).unwrap();
        fs::write(dir.path().join("data_bundle.1234abcd.feather"), b"x").unwrap();
        fs::write(dir.path().join("old").join("data_bundle.feather"), b"x").unwrap();
        fs::write(dir.path().join("other.1234abcd.feather"), b"x").unwrap();
        fs::write(dir.path().join("data_bundle.1234abcd.bin"), b"x").unwrap();

        let removed = store.evict_obsolete("data_bundle", &current);
        assert_eq!(removed, 2);
        assert!(current.exists());
        assert!(dir.path().join("other.1234abcd.feather").exists());
        assert!(dir.path().join("data_bundle.1234abcd.bin").exists());
        assert!(!dir.path().join("data_bundle.1234abcd.feather").exists());
    }

    #[test]
    fn test_evict_never_removes_keep_even_if_legacy_named() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let keep = dir.path().join("data_bundle.feather");
        fs::write(&keep, b"x").unwrap();
        assert_eq!(store.evict_obsolete("data_bundle", &keep), 0);
        assert!(keep.exists());
    }
}
