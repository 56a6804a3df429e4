use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::Feature;

/// Memoized geokoding results, keyed by normalized matrikkel identifier.
///
/// The file is read once when the cache is opened and rewritten in full by
/// [`GeometryCache::persist`]. Entries never expire.
#[derive(Debug)]
pub struct GeometryCache {
    path: PathBuf,
    entries: BTreeMap<String, Feature>,
    modified: bool,
}

impl GeometryCache {
    /// Open the cache at `path`. A missing or unparsable file yields an
    /// empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(Some(entries)) => {
                debug!(path = %path.display(), entries = entries.len(), "Loaded geometry cache");
                entries
            }
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable geometry cache");
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries,
            modified: false,
        }
    }

    fn read_entries(path: &Path) -> Result<Option<BTreeMap<String, Feature>>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;

        let entries = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;

        Ok(Some(entries))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, matrikkel_id: &str) -> Option<&Feature> {
        self.entries.get(matrikkel_id)
    }

    pub fn contains(&self, matrikkel_id: &str) -> bool {
        self.entries.contains_key(matrikkel_id)
    }

    /// Store a feature and mark the cache as needing a write.
    pub fn insert(&mut self, matrikkel_id: impl Into<String>, feature: Feature) {
        self.entries.insert(matrikkel_id.into(), feature);
        self.modified = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Write the whole cache to disk if anything was added since it was
    /// loaded. Returns whether a write happened.
    pub fn persist(&mut self) -> Result<bool> {
        if !self.modified {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "Persisted geometry cache");
        self.modified = false;
        Ok(true)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn polygon() -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]},
            "properties": {"kommunenummer": "3236"}
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GeometryCache::load(dir.path().join("cache.json"));
        assert!(cache.is_empty());
        assert!(!cache.is_modified());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{\"3236-123/2\": [").unwrap();

        let cache = GeometryCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let mut cache = GeometryCache::load(&path);
        cache.insert("3236-123/2", polygon());
        assert!(cache.is_modified());
        assert!(cache.persist().unwrap());
        assert!(!cache.is_modified());

        let reloaded = GeometryCache::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("3236-123/2"), Some(&polygon()));
    }

    #[test]
    fn test_persist_skips_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{}").unwrap();

        let mut cache = GeometryCache::load(&path);
        assert!(!cache.persist().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_persist_overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut first = GeometryCache::load(&path);
        let mut second = GeometryCache::load(&path);
        first.insert("1-1/1", polygon());
        second.insert("2-2/2", polygon());
        first.persist().unwrap();
        second.persist().unwrap();

        // Last writer wins
        let reloaded = GeometryCache::load(&path);
        assert!(!reloaded.contains("1-1/1"));
        assert!(reloaded.contains("2-2/2"));
    }
}
