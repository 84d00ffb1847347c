//! Artifact library: the metadata catalog and the content-addressed store.
//!
//! # Storage Layout
//!
//! ```text
//! ./
//! ├── images.json               # Catalog: JSON array of records
//! ├── images.json.lock          # Advisory lock held during upserts
//! └── images/
//!     ├── <sha256>.png          # Generated boards, named by digest
//!     └── image_<seq>.png       # Captured frames, numbered
//! ```

pub mod catalog;
pub mod content;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub use catalog::{Catalog, CatalogError, CatalogStore, Upsert};
pub use content::{ContentStore, StoredArtifact, Verification};

/// Replace `path` with `bytes` without ever exposing a half-written file.
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over the target. Creates parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// [`write_atomic`] on the blocking pool
pub async fn write_atomic_async(path: PathBuf, bytes: Vec<u8>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
