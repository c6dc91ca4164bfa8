use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::domain::{SeriesAccession, TableKind};
use crate::error::GeoError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub dataset: SeriesAccession,
    pub kind: TableKind,
}

impl CacheKey {
    pub fn new(dataset: SeriesAccession, kind: TableKind) -> Self {
        Self { dataset, kind }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.kind)
    }
}

pub trait CacheBackend: Send + Sync {
    fn read(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, GeoError>;
    fn write(&self, key: &CacheKey, content: &[u8]) -> Result<(), GeoError>;
    fn remove_dataset(&self, dataset: &SeriesAccession) -> Result<bool, GeoError>;
    fn clear(&self) -> Result<(), GeoError>;
}

#[derive(Debug, Clone)]
pub struct FsCacheBackend {
    root: Utf8PathBuf,
}

impl FsCacheBackend {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn dataset_dir(&self, dataset: &SeriesAccession) -> Utf8PathBuf {
        self.root.join(dataset.as_str())
    }

    pub fn entry_path(&self, key: &CacheKey) -> Utf8PathBuf {
        self.dataset_dir(&key.dataset)
            .join(format!("{}.json", key.kind.as_str()))
    }
}

impl CacheBackend for FsCacheBackend {
    fn read(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, GeoError> {
        match fs::read(self.entry_path(key).as_std_path()) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(GeoError::CacheRead {
                key: key.to_string(),
                message: err.to_string(),
            }),
        }
    }

    fn write(&self, key: &CacheKey, content: &[u8]) -> Result<(), GeoError> {
        let write_err = |err: std::io::Error| GeoError::CacheWrite {
            key: key.to_string(),
            message: err.to_string(),
        };
        let dir = self.dataset_dir(&key.dataset);
        fs::create_dir_all(dir.as_std_path()).map_err(write_err)?;
        let mut temp = Builder::new()
            .prefix(".geo-cache")
            .tempfile_in(dir.as_std_path())
            .map_err(write_err)?;
        temp.write_all(content).map_err(write_err)?;
        temp.flush().map_err(write_err)?;
        temp.persist(self.entry_path(key).as_std_path())
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }

    fn remove_dataset(&self, dataset: &SeriesAccession) -> Result<bool, GeoError> {
        let dir = self.dataset_dir(dataset);
        if !dir.as_std_path().exists() {
            return Ok(false);
        }
        fs::remove_dir_all(dir.as_std_path())
            .map_err(|err| GeoError::Filesystem(err.to_string()))?;
        Ok(true)
    }

    fn clear(&self) -> Result<(), GeoError> {
        if self.root.as_std_path().exists() {
            fs::remove_dir_all(self.root.as_std_path())
                .map_err(|err| GeoError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CacheKey, Vec<u8>>>, GeoError> {
        self.entries
            .lock()
            .map_err(|_| GeoError::Filesystem("memory cache lock poisoned".to_string()))
    }
}

impl CacheBackend for MemoryCacheBackend {
    fn read(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, GeoError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &CacheKey, content: &[u8]) -> Result<(), GeoError> {
        self.lock()?.insert(key.clone(), content.to_vec());
        Ok(())
    }

    fn remove_dataset(&self, dataset: &SeriesAccession) -> Result<bool, GeoError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|key, _| &key.dataset != dataset);
        Ok(entries.len() != before)
    }

    fn clear(&self) -> Result<(), GeoError> {
        self.lock()?.clear();
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    dataset: SeriesAccession,
    kind: TableKind,
    cached_at: String,
    tool: String,
    payload: T,
}

// One lock spans lookup, compute and write.
pub struct TableCache<B: CacheBackend> {
    backend: B,
    guard: Mutex<()>,
}

impl<B: CacheBackend> TableCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            guard: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get_or_compute<T, F>(&self, key: &CacheKey, compute: F) -> Result<T, GeoError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, GeoError>,
    {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| GeoError::Filesystem("cache lock poisoned".to_string()))?;

        if let Some(content) = self.backend.read(key)? {
            match serde_json::from_slice::<CacheEntry<T>>(&content) {
                Ok(entry) => {
                    tracing::debug!(%key, "cache hit");
                    return Ok(entry.payload);
                }
                Err(err) => {
                    tracing::warn!(%key, error = %err, "discarding unreadable cache entry");
                }
            }
        }

        tracing::debug!(%key, "cache miss");
        let payload = compute()?;
        let entry = CacheEntry {
            dataset: key.dataset.clone(),
            kind: key.kind,
            cached_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("geo-tools/{}", env!("CARGO_PKG_VERSION")),
            payload,
        };
        let content = serde_json::to_vec(&entry).map_err(|err| GeoError::CacheWrite {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.backend.write(key, &content)?;
        tracing::info!(%key, bytes = content.len(), "cached table");
        Ok(entry.payload)
    }

    pub fn remove_dataset(&self, dataset: &SeriesAccession) -> Result<bool, GeoError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| GeoError::Filesystem("cache lock poisoned".to_string()))?;
        self.backend.remove_dataset(dataset)
    }

    pub fn clear(&self) -> Result<(), GeoError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| GeoError::Filesystem("cache lock poisoned".to_string()))?;
        self.backend.clear()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use assert_matches::assert_matches;

    use super::*;

    fn key(kind: TableKind) -> CacheKey {
        CacheKey::new("GSE41037".parse().unwrap(), kind)
    }

    #[test]
    fn computes_once_per_key() {
        let cache = TableCache::new(MemoryCacheBackend::new());
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(vec!["a".to_string(), "b".to_string()])
        };

        let first: Vec<String> = cache.get_or_compute(&key(TableKind::Series), compute).unwrap();
        let second: Vec<String> = cache.get_or_compute(&key(TableKind::Series), compute).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);

        let _: Vec<String> = cache.get_or_compute(&key(TableKind::Info), compute).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_compute_leaves_slot_empty() {
        let cache = TableCache::new(MemoryCacheBackend::new());
        let result: Result<Vec<String>, _> = cache.get_or_compute(&key(TableKind::Series), || {
            Err(GeoError::TableParse("boom".to_string()))
        });
        assert_matches!(result, Err(GeoError::TableParse(_)));
        assert!(cache.backend().is_empty());
    }

    #[test]
    fn unreadable_entry_is_recomputed() {
        let cache = TableCache::new(MemoryCacheBackend::new());
        cache
            .backend()
            .write(&key(TableKind::Series), b"{not json")
            .unwrap();
        let value: u32 = cache
            .get_or_compute(&key(TableKind::Series), || Ok(7))
            .unwrap();
        assert_eq!(value, 7);
        let again: u32 = cache
            .get_or_compute(&key(TableKind::Series), || Ok(8))
            .unwrap();
        assert_eq!(again, 7);
    }

    #[test]
    fn fs_backend_layout_and_removal() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap();
        let backend = FsCacheBackend::new(root);
        let series_key = key(TableKind::Series);

        assert_eq!(backend.read(&series_key).unwrap(), None);
        backend.write(&series_key, b"{}").unwrap();
        assert!(backend.entry_path(&series_key).ends_with("GSE41037/series.json"));
        assert_eq!(backend.read(&series_key).unwrap(), Some(b"{}".to_vec()));

        assert!(backend.remove_dataset(&series_key.dataset).unwrap());
        assert!(!backend.remove_dataset(&series_key.dataset).unwrap());
        assert_eq!(backend.read(&series_key).unwrap(), None);
    }
}
