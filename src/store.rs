// store.rs - Append-only JSONL key/value store for resolver caches
//
// Each insert appends one `{"key": ..., "value": ...}` line and flushes, so an
// interrupted run loses at most the line being written. On open the file is
// replayed (last write wins, corrupt lines skipped) and rewritten through a
// temp file + rename when it carried duplicates or garbage.

use crate::error::EnrichError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Deserialize)]
struct StoreLine<V> {
    key: String,
    value: V,
}

#[derive(Serialize)]
struct StoreLineRef<'a, V> {
    key: &'a str,
    value: &'a V,
}

/// Persistent map from domain to a cached resolver verdict.
/// One writer per file: all access goes through the inner mutex.
pub struct JsonlStore<V> {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, V>>,
}

impl<V> JsonlStore<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Open (or lazily create) the store at `path`.
    /// An unreadable file is treated as empty.
    pub fn open(path: &Path) -> Self {
        let entries = match Self::replay(path) {
            Ok((entries, lines_read)) => {
                if lines_read > entries.len() {
                    if let Err(e) = Self::compact(path, &entries) {
                        warn!("Failed to compact cache {}: {:#}", path.display(), e);
                    }
                }
                entries
            }
            Err(e) => {
                warn!("{}", e);
                BTreeMap::new()
            }
        };

        debug!("Opened cache {} with {} entries", path.display(), entries.len());
        Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Record a value and append it to disk
    pub fn insert(&self, key: &str, value: V) -> Result<()> {
        let mut entries = self.lock();
        Self::append_line(&self.path, key, &value)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove one key; returns whether it was present
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        Self::compact(&self.path, &entries)?;
        Ok(true)
    }

    /// Drop every entry; returns how many were removed
    pub fn clear(&self) -> Result<usize> {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove cache file: {}", self.path.display()))?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted keys
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, V>> {
        // A poisoned map is still a consistent map: every mutation completes
        // its disk write before touching it.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read every line, returning the map and the number of non-blank lines
    fn replay(path: &Path) -> Result<(BTreeMap<String, V>, usize), EnrichError> {
        let mut entries = BTreeMap::new();
        if !path.exists() {
            return Ok((entries, 0));
        }

        let file = File::open(path).map_err(|e| EnrichError::CacheRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut lines_read = 0;
        let mut skipped = 0;
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| EnrichError::CacheRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            lines_read += 1;

            match serde_json::from_str::<StoreLine<V>>(&line) {
                Ok(entry) => {
                    entries.insert(entry.key, entry.value);
                }
                Err(e) => {
                    skipped += 1;
                    if skipped <= 3 {
                        warn!("Skipping corrupt cache line {} in {}: {}", line_num + 1, path.display(), e);
                    }
                }
            }
        }

        if skipped > 3 {
            warn!("Skipped {} corrupt lines in {}", skipped, path.display());
        }

        Ok((entries, lines_read))
    }

    fn append_line(path: &Path, key: &str, value: &V) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string(&StoreLineRef { key, value })
            .context("Failed to serialize cache entry")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open cache file: {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }

    /// Rewrite the file with one line per entry (write to temp file, then rename)
    fn compact(path: &Path, entries: &BTreeMap<String, V>) -> Result<()> {
        let temp_path = path.with_extension("jsonl.tmp");
        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp cache file: {}", temp_path.display()))?;
            let mut writer = BufWriter::new(file);
            for (key, value) in entries {
                serde_json::to_writer(&mut writer, &StoreLineRef { key, value })
                    .context("Failed to serialize cache entry")?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to replace cache file: {}", path.display()))?;
        debug!("Compacted cache {} to {} entries", path.display(), entries.len());
        Ok(())
    }
}
