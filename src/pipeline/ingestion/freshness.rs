use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;
use walkdir::WalkDir;

use crate::constants::FRESHNESS_KEY_LEN;
use crate::error::Result;

/// Short content-derived key summarizing the mtimes of every raw input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FreshnessKey(String);

impl FreshnessKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FreshnessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every file under `data_root` whose extension is in `extensions`, in
/// lexicographic path order.
pub fn discover_inputs(data_root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(data_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| extensions.iter().any(|want| want == ext));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Hash the modification times of all keyed inputs under `data_root`.
///
/// An empty input set still yields a stable key (the digest of nothing), so
/// callers never need to special-case it.
pub fn freshness_key(data_root: &Path, extensions: &[String]) -> Result<FreshnessKey> {
    // Surface a missing root as an I/O error rather than an empty key
    fs::metadata(data_root)?;

    let mut hasher = Sha256::new();
    let files = discover_inputs(data_root, extensions)?;
    for path in &files {
        let modified = fs::metadata(path)?.modified()?;
        let stamp = match modified.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => -e.duration().as_secs_f64(),
        };
        hasher.update(stamp.to_string().as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    debug!(inputs = files.len(), key = &digest[..FRESHNESS_KEY_LEN], "Computed freshness key");
    Ok(FreshnessKey(digest[..FRESHNESS_KEY_LEN].to_string()))
}
