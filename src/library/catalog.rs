//! Catalog of generated artifacts.
//!
//! A flat JSON array of records, one per content hash. Every write loads the
//! whole file, applies an upsert in memory and rewrites the file in full.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use super::write_atomic_async;
use crate::domain::Record;

/// Errors that can occur with the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to {action} catalog {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to lock catalog {path}: {source}")]
    Lock { path: PathBuf, source: io::Error },

    #[error("Record has an empty hash")]
    MissingHash,

    #[error("Hash prefix '{prefix}' matches {count} records")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No record had this hash; appended at `index`
    Inserted { index: usize },

    /// The record at `index` had this hash and was overwritten
    Replaced { index: usize },
}

impl Upsert {
    /// Position of the record in the catalog
    pub fn index(self) -> usize {
        match self {
            Upsert::Inserted { index } | Upsert::Replaced { index } => index,
        }
    }

    pub fn is_insert(self) -> bool {
        matches!(self, Upsert::Inserted { .. })
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Serialize the catalog as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load the catalog from disk; a missing file is an empty catalog
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No catalog yet, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    action: "read",
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json(&content).map_err(|source| CatalogError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save the catalog to disk, replacing the file atomically
    pub async fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let content = self.to_json()?;
        write_atomic_async(path.to_path_buf(), content.into_bytes())
            .await
            .map_err(|source| CatalogError::Io {
                action: "write",
                path: path.to_path_buf(),
                source,
            })
    }

    /// Insert a record, or overwrite the one sharing its hash in place.
    ///
    /// Later records with the same hash (only possible in a hand-edited
    /// file) are dropped, so the hash is unique afterwards.
    pub fn upsert(&mut self, record: Record) -> Result<Upsert, CatalogError> {
        if !record.has_hash() {
            return Err(CatalogError::MissingHash);
        }

        if let Some(index) = self.position(&record.hash) {
            let before = self.records.len();
            let mut position = 0;
            self.records.retain(|r| {
                let keep = position <= index || r.hash != record.hash;
                position += 1;
                keep
            });
            let dropped = before - self.records.len();
            if dropped > 0 {
                warn!(hash = %record.hash, dropped, "Dropped duplicate catalog records");
            }

            self.records[index] = record;
            Ok(Upsert::Replaced { index })
        } else {
            self.records.push(record);
            Ok(Upsert::Inserted {
                index: self.records.len() - 1,
            })
        }
    }

    /// Index of the record with this hash
    pub fn position(&self, hash: &str) -> Option<usize> {
        self.records.iter().position(|r| r.hash == hash)
    }

    /// Get a record by hash
    pub fn get(&self, hash: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.hash == hash)
    }

    /// Find the single record whose hash starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Option<&Record>, CatalogError> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Ok(None);
        }

        // An exact hit wins even if it is also a prefix of others
        if let Some(record) = self.get(&prefix) {
            return Ok(Some(record));
        }

        let matches: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| r.hash.starts_with(&prefix))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            count => Err(CatalogError::AmbiguousPrefix { prefix, count }),
        }
    }

    /// Records in stored order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// File-backed catalog at an explicit location
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

/// Exclusive advisory lock, released on drop
struct CatalogLock {
    file: std::fs::File,
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl CatalogStore {
    /// Create a store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the catalog file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file used for locking (`images.json` -> `images.json.lock`)
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Load the current catalog
    pub async fn load(&self) -> Result<Catalog, CatalogError> {
        Catalog::load(&self.path).await
    }

    /// Replace the persisted catalog
    pub async fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        catalog.save(&self.path).await
    }

    /// Load, upsert and save under the catalog lock
    pub async fn upsert(&self, record: Record) -> Result<Upsert, CatalogError> {
        if !record.has_hash() {
            return Err(CatalogError::MissingHash);
        }

        let _lock = self.lock().await?;

        let mut catalog = self.load().await?;
        let hash = record.hash.clone();
        let outcome = catalog.upsert(record)?;
        self.save(&catalog).await?;

        info!(
            hash = %hash,
            index = outcome.index(),
            inserted = outcome.is_insert(),
            records = catalog.len(),
            "Catalog updated"
        );

        Ok(outcome)
    }

    async fn lock(&self) -> Result<CatalogLock, CatalogError> {
        let lock_path = self.lock_path();

        let result = tokio::task::spawn_blocking({
            let lock_path = lock_path.clone();
            move || -> io::Result<std::fs::File> {
                if let Some(parent) = lock_path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .write(true)
                    .open(&lock_path)?;
                file.lock_exclusive()?;
                Ok(file)
            }
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|r| r);

        match result {
            Ok(file) => Ok(CatalogLock { file }),
            Err(source) => Err(CatalogError::Lock {
                path: lock_path,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamValue;

    fn record(hash: &str) -> Record {
        Record::new(hash)
    }

    #[test]
    fn test_catalog_upsert_and_get() {
        let mut catalog = Catalog::new();
        let outcome = catalog
            .upsert(record("abc123").with_param("width", 5i64))
            .unwrap();

        assert_eq!(outcome, Upsert::Inserted { index: 0 });
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("abc123").is_some());
        assert!(catalog.get("abc").is_none());
    }

    #[test]
    fn test_catalog_replaces_in_place() {
        let mut catalog = Catalog::new();
        catalog.upsert(record("aaa")).unwrap();
        catalog.upsert(record("bbb").with_param("length", 7i64)).unwrap();
        catalog.upsert(record("ccc")).unwrap();

        let outcome = catalog
            .upsert(record("bbb").with_param("length", 9i64))
            .unwrap();

        assert_eq!(outcome, Upsert::Replaced { index: 1 });
        let hashes: Vec<_> = catalog.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, ["aaa", "bbb", "ccc"]);
        assert_eq!(
            catalog.get("bbb").unwrap().param("length"),
            Some(&ParamValue::Integer(9))
        );
    }

    #[test]
    fn test_upsert_collapses_duplicate_hashes() {
        let mut catalog = Catalog::from_json(
            r#"[{"hash":"aaa","length":7},{"hash":"bbb"},{"hash":"aaa","length":8}]"#,
        )
        .unwrap();

        let outcome = catalog
            .upsert(record("aaa").with_param("length", 9i64))
            .unwrap();

        assert_eq!(outcome, Upsert::Replaced { index: 0 });
        let hashes: Vec<_> = catalog.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, ["aaa", "bbb"]);
        assert_eq!(
            catalog.get("aaa").unwrap().param("length"),
            Some(&ParamValue::Integer(9))
        );
    }

    #[test]
    fn test_catalog_rejects_empty_hash() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.upsert(record("")),
            Err(CatalogError::MissingHash)
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_find_by_prefix() {
        let mut catalog = Catalog::new();
        catalog.upsert(record("abc123")).unwrap();
        catalog.upsert(record("abd456")).unwrap();
        catalog.upsert(record("ab")).unwrap();

        assert_eq!(
            catalog.find_by_prefix("abc").unwrap().unwrap().hash,
            "abc123"
        );
        assert_eq!(
            catalog.find_by_prefix("ABD").unwrap().unwrap().hash,
            "abd456"
        );
        // Exact match beats ambiguity
        assert_eq!(catalog.find_by_prefix("ab").unwrap().unwrap().hash, "ab");
        assert!(catalog.find_by_prefix("zz").unwrap().is_none());
        assert!(catalog.find_by_prefix("").unwrap().is_none());

        catalog.upsert(record("abc789")).unwrap();
        assert!(matches!(
            catalog.find_by_prefix("abc"),
            Err(CatalogError::AmbiguousPrefix { count: 2, .. })
        ));
    }

    #[test]
    fn test_catalog_json_is_bare_array() {
        let mut catalog = Catalog::new();
        catalog.upsert(record("aaa")).unwrap();

        let value: serde_json::Value = serde_json::from_str(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([{"hash": "aaa"}]));

        assert_eq!(Catalog::from_json("[]").unwrap(), Catalog::new());
    }

    #[test]
    fn test_lock_path() {
        let store = CatalogStore::new("/data/images.json");
        assert_eq!(store.lock_path(), PathBuf::from("/data/images.json.lock"));

        let store = CatalogStore::new("images.json");
        assert_eq!(store.lock_path(), PathBuf::from("images.json.lock"));
    }
}
