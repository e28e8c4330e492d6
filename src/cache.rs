use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::options::TransformOptions;
use crate::transform::TransformResult;

pub const DEFAULT_CACHE_DIR: &str = ".amd2closure/cache";

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub result: TransformResult,
}

/// On-disk cache of transform results, keyed by unit path and validated
/// against a hash of (path, source, options).
pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                log::warn!("cannot create cache dir {}: {}", cache_dir.display(), e);
            }
        }
        Self { cache_dir }
    }

    pub fn compute_hash(file_path: &str, source: &str, options: &TransformOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(file_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(source.as_bytes());
        hasher.update([0u8]);
        // options serialize deterministically (struct field order)
        if let Ok(json) = serde_json::to_string(options) {
            hasher.update(json.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    fn get_cache_path(&self, file_path: &str) -> PathBuf {
        let safe_name = file_path
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(
        &self,
        file_path: &str,
        source: &str,
        options: &TransformOptions,
    ) -> Option<TransformResult> {
        let cache_path = self.get_cache_path(file_path);
        let data = fs::read_to_string(&cache_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("cache entry for {} is corrupt: {}", file_path, e);
                fs::remove_file(cache_path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(file_path, source, options) {
            log::debug!("cache hit: {}", file_path);
            Some(entry.result)
        } else {
            None
        }
    }

    pub fn set(
        &self,
        file_path: &str,
        source: &str,
        options: &TransformOptions,
        result: &TransformResult,
    ) {
        let entry = CacheEntry {
            hash: Self::compute_hash(file_path, source, options),
            result: result.clone(),
        };
        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(self.get_cache_path(file_path), data) {
                    log::warn!("cannot write cache entry for {}: {}", file_path, e);
                }
            }
            Err(e) => log::warn!("cannot serialize cache entry for {}: {}", file_path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;

    #[test]
    fn test_round_trip_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path().join("cache"));
        let options = TransformOptions::default();
        let source = "define(function () { return 1; });";
        let result = transform("a/b.js", source, &options).unwrap();

        assert!(cache.get("a/b.js", source, &options).is_none());
        cache.set("a/b.js", source, &options, &result);
        assert_eq!(cache.get("a/b.js", source, &options), Some(result));

        // any change to the key inputs misses
        assert!(cache.get("a/b.js", "define({});", &options).is_none());
        let other = options.clone().with_namespace("x");
        assert!(cache.get("a/b.js", source, &other).is_none());
    }

    #[test]
    fn test_corrupt_entry_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path());
        let path = dir.path().join("u.js.json");
        fs::write(&path, "not json").unwrap();
        assert!(cache.get("u.js", "", &TransformOptions::default()).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_hash_depends_on_path() {
        let o = TransformOptions::default();
        assert_ne!(
            IncrementalCache::compute_hash("a.js", "x", &o),
            IncrementalCache::compute_hash("b.js", "x", &o)
        );
    }
}
