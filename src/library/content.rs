//! Content-addressed artifact storage.
//!
//! Artifacts land in a single directory as `<digest>.<ext>`, so the same
//! bytes always map to the same file and two different boards never collide.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use tokio::fs;
use tracing::debug;

use super::{write_atomic_async, Catalog};
use crate::domain::{Artifact, ContentDigest};

/// Where an artifact ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub digest: ContentDigest,
    pub path: PathBuf,
    /// False when an identical file was already present
    pub created: bool,
}

/// Outcome of re-hashing a stored artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// File exists and its bytes hash to the recorded digest
    Ok(PathBuf),

    /// No file named after the digest
    Missing,

    /// File exists but its content changed
    Mismatch { path: PathBuf, actual: ContentDigest },

    /// File exists but the recorded hash is not a SHA-256 digest (older
    /// catalogs used MD5), so its content cannot be checked
    Unverifiable(PathBuf),
}

impl Verification {
    /// Missing and changed files are failures; unverifiable ones are not
    pub fn is_failure(&self) -> bool {
        matches!(self, Verification::Missing | Verification::Mismatch { .. })
    }
}

/// Directory of content-addressed artifacts
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path an artifact with this digest would have
    pub fn path_for(&self, digest: &ContentDigest, extension: &str) -> PathBuf {
        self.dir.join(digest.file_name(extension))
    }

    /// Check whether an artifact with this digest is stored
    pub async fn exists(&self, digest: &ContentDigest, extension: &str) -> bool {
        fs::try_exists(self.path_for(digest, extension))
            .await
            .unwrap_or(false)
    }

    /// Store an artifact under its digest
    pub async fn put(&self, artifact: &Artifact) -> Result<StoredArtifact> {
        let digest = artifact.digest();
        let path = self.path_for(&digest, artifact.format.extension());

        if self.exists(&digest, artifact.format.extension()).await {
            debug!(path = %path.display(), "Artifact already stored");
            return Ok(StoredArtifact {
                digest,
                path,
                created: false,
            });
        }

        write_atomic_async(path.clone(), artifact.bytes.clone())
            .await
            .with_context(|| format!("Failed to write artifact: {}", path.display()))?;

        Ok(StoredArtifact {
            digest,
            path,
            created: true,
        })
    }

    /// Find the stored file for a hash, whatever its extension
    pub fn locate(&self, hash: &str) -> Result<Option<PathBuf>> {
        let pattern = format!("{}/{}.*", Pattern::escape(&self.dir.to_string_lossy()), Pattern::escape(hash));

        let found = glob::glob(&pattern)
            .with_context(|| format!("Invalid artifact pattern: {}", pattern))?
            .filter_map(|entry| entry.ok())
            .find(|path| path.is_file());

        Ok(found)
    }

    /// Re-hash the artifact a record points at
    pub async fn verify(&self, hash: &str) -> Result<Verification> {
        let Some(path) = self.locate(hash)? else {
            return Ok(Verification::Missing);
        };

        if !ContentDigest::parse(hash).is_some_and(|d| d.is_sha256()) {
            return Ok(Verification::Unverifiable(path));
        }

        let bytes = fs::read(&path)
            .await
            .with_context(|| format!("Failed to read artifact: {}", path.display()))?;
        let actual = ContentDigest::of(&bytes);

        if actual.as_str() == hash {
            Ok(Verification::Ok(path))
        } else {
            Ok(Verification::Mismatch { path, actual })
        }
    }

    /// Digest-named files in the store that no catalog record points at.
    ///
    /// Files whose stem is not a hex digest (captured frames, notes) are
    /// not considered.
    pub fn orphans(&self, catalog: &Catalog) -> Result<Vec<PathBuf>> {
        let pattern = format!("{}/*.*", Pattern::escape(&self.dir.to_string_lossy()));

        let mut orphans: Vec<PathBuf> = glob::glob(&pattern)
            .with_context(|| format!("Invalid artifact pattern: {}", pattern))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(ContentDigest::parse)
                    .map(|digest| catalog.get(digest.as_str()).is_none())
                    .unwrap_or(false)
            })
            .collect();

        orphans.sort();
        Ok(orphans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageFormat, Record};
    use tempfile::TempDir;

    fn png(payload: &[u8]) -> Artifact {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(payload);
        Artifact::new(bytes, ImageFormat::Png)
    }

    #[tokio::test]
    async fn test_put_names_file_by_digest() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::new(temp.path().join("images"));
        let artifact = png(b"board");

        let stored = store.put(&artifact).await.unwrap();

        assert!(stored.created);
        assert_eq!(stored.digest, artifact.digest());
        assert_eq!(
            stored.path,
            temp.path()
                .join("images")
                .join(format!("{}.png", artifact.digest()))
        );
        assert_eq!(std::fs::read(&stored.path).unwrap(), artifact.bytes);
    }

    #[tokio::test]
    async fn test_put_same_bytes_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::new(temp.path());
        let artifact = png(b"board");

        let first = store.put(&artifact).await.unwrap();
        let second = store.put(&artifact).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.path, second.path);
    }

    #[tokio::test]
    async fn test_verify() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::new(temp.path());
        let artifact = png(b"board");
        let stored = store.put(&artifact).await.unwrap();
        let hash = stored.digest.as_str().to_string();

        assert_eq!(
            store.verify(&hash).await.unwrap(),
            Verification::Ok(stored.path.clone())
        );

        std::fs::write(&stored.path, b"tampered").unwrap();
        assert!(matches!(
            store.verify(&hash).await.unwrap(),
            Verification::Mismatch { .. }
        ));

        std::fs::remove_file(&stored.path).unwrap();
        assert_eq!(store.verify(&hash).await.unwrap(), Verification::Missing);
    }

    #[tokio::test]
    async fn test_md5_named_artifact_is_unverifiable() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::new(temp.path());
        let md5 = "0123456789abcdef0123456789abcdef";
        let path = temp.path().join(format!("{}.png", md5));
        std::fs::write(&path, b"board from an older catalog").unwrap();

        let verification = store.verify(md5).await.unwrap();

        assert_eq!(verification, Verification::Unverifiable(path));
        assert!(!verification.is_failure());
        assert!(store.verify("fedcba9876543210fedcba9876543210").await.unwrap().is_failure());
    }

    #[tokio::test]
    async fn test_orphans_skip_non_digest_files() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::new(temp.path());

        let kept = store.put(&png(b"kept")).await.unwrap();
        let orphan = store.put(&png(b"orphan")).await.unwrap();
        std::fs::write(temp.path().join("image_0.png"), b"frame").unwrap();

        let mut catalog = Catalog::new();
        catalog.upsert(Record::for_digest(&kept.digest)).unwrap();

        assert_eq!(store.orphans(&catalog).unwrap(), vec![orphan.path]);
    }

    #[test]
    fn test_locate_missing_dir() {
        let store = ContentStore::new("/nonexistent/calibcat/images");
        assert!(store.locate("abc").unwrap().is_none());
    }
}
