//! Two-level tone cache: a process-local map consulted synchronously during
//! distribution, backed by a durable JSON KV store namespaced by
//! `canonical_path:file_size`. Concurrent writers of the same key are
//! idempotent (the computation is deterministic), so last-writer-wins is
//! fine -- matching the policy the teacher applies to its own metadata-block
//! writes in `encryption_core::blob::write_metadata_block`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::tone::ImageCapacity;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedCache {
    entries: HashMap<String, ImageCapacity>,
}

pub struct ToneCache {
    memory: Mutex<HashMap<String, ImageCapacity>>,
    durable_path: Option<PathBuf>,
}

fn cache_key(path: &Path, file_size: u64) -> String {
    format!("{}:{}", path.display(), file_size)
}

impl ToneCache {
    /// A cache with no durable backing, useful for tests and for one-shot
    /// tools that never reuse a process.
    pub fn in_memory() -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            durable_path: None,
        }
    }

    /// A cache persisted to `namespace_dir/tone_cache.json`, loaded eagerly
    /// so the in-memory lookup used during distribution stays synchronous.
    pub fn open(namespace_dir: &Path) -> Self {
        let durable_path = namespace_dir.join("tone_cache.json");
        let memory = load_durable(&durable_path).unwrap_or_default();
        Self {
            memory: Mutex::new(memory),
            durable_path: Some(durable_path),
        }
    }

    pub fn get(&self, path: &Path, file_size: u64) -> Option<ImageCapacity> {
        let key = cache_key(path, file_size);
        self.memory.lock().unwrap().get(&key).copied()
    }

    pub fn set(&self, path: &Path, file_size: u64, capacity: ImageCapacity) {
        let key = cache_key(path, file_size);
        self.memory.lock().unwrap().insert(key, capacity);
        self.flush();
    }

    fn flush(&self) {
        let Some(durable_path) = &self.durable_path else {
            return;
        };
        let snapshot = PersistedCache {
            entries: self.memory.lock().unwrap().clone(),
        };
        if let Some(parent) = durable_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("failed to create tone cache directory: {}", e);
                return;
            }
        }
        match serde_json::to_vec_pretty(&snapshot) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(durable_path, bytes) {
                    warn!("failed to persist tone cache to {}: {}", durable_path.display(), e);
                }
            }
            Err(e) => warn!("failed to serialize tone cache: {}", e),
        }
    }
}

fn load_durable(path: &Path) -> Option<HashMap<String, ImageCapacity>> {
    let bytes = std::fs::read(path).ok()?;
    let parsed: PersistedCache = serde_json::from_slice(&bytes).ok()?;
    Some(parsed.entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_durable_store() {
        let dir = tempdir().unwrap();
        let cap = ImageCapacity { low: 1, mid: 2, high: 3 };
        let path = PathBuf::from("/carriers/a.png");

        {
            let cache = ToneCache::open(dir.path());
            cache.set(&path, 1234, cap);
        }
        let cache = ToneCache::open(dir.path());
        assert_eq!(cache.get(&path, 1234), Some(cap));
    }

    #[test]
    fn distinguishes_by_size() {
        let cache = ToneCache::in_memory();
        let path = PathBuf::from("/carriers/a.png");
        cache.set(&path, 100, ImageCapacity { low: 1, mid: 0, high: 0 });
        assert_eq!(cache.get(&path, 200), None);
    }
}
