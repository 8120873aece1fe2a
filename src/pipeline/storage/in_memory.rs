use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::traits::{CacheId, CacheStore};
use crate::error::Result;
use crate::types::Table;

/// In-memory cache implementation for embedding and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<Mutex<HashMap<String, Table>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // poisoned locks are recovered, never treated as empty
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Table>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for InMemoryCacheStore {
    fn location(&self, id: &CacheId) -> PathBuf {
        PathBuf::from(id.file_name())
    }

    fn load(&self, id: &CacheId, allow_cache: bool) -> Result<Option<Table>> {
        if !allow_cache {
            return Ok(None);
        }
        let entries = self.entries();
        Ok(entries.get(&id.file_name()).cloned())
    }

    fn save(&self, id: &CacheId, table: &Table) -> Result<PathBuf> {
        let name = id.file_name();
        let mut entries = self.entries();
        entries.insert(name.clone(), table.clone());
        debug!(entry = %name, rows = table.len(), "Stored table in memory");
        Ok(PathBuf::from(name))
    }

    fn evict_obsolete(&self, _stem: &str, _keep: &Path) -> usize {
        // nothing legacy can exist in memory
        0
    }
}
