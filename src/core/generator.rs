//! Board generation: render, hash, store, catalog.
//!
//! The whole run is one linear sequence. The board is validated before
//! anything touches disk, so a bad parameter leaves no partial work behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::fs;
use tracing::{info, instrument};

use crate::adapters::BoardRenderer;
use crate::domain::{Artifact, BoardSpec, ContentDigest, ImageFormat, ImageSize, Record};
use crate::library::{CatalogStore, ContentStore, Upsert};

/// Where the board image comes from
pub enum BoardSource<'a> {
    /// Draw it with a renderer
    Render(&'a dyn BoardRenderer),

    /// Use an image rendered beforehand
    File(PathBuf),
}

/// A rendered board in a scratch directory, removed on drop
pub struct RenderedBoard {
    _dir: TempDir,
    path: PathBuf,
}

impl RenderedBoard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render `spec` into a fresh scratch directory under `scratch_root`
pub async fn render_board(
    renderer: &dyn BoardRenderer,
    spec: &BoardSpec,
    size: ImageSize,
    scratch_root: &Path,
) -> Result<RenderedBoard> {
    fs::create_dir_all(scratch_root)
        .await
        .with_context(|| format!("Failed to create directory: {}", scratch_root.display()))?;

    let dir = tempfile::Builder::new()
        .prefix(".render-")
        .tempdir_in(scratch_root)
        .context("Failed to create render directory")?;
    let path = dir.path().join("board.png");

    renderer
        .render(spec, size, &path)
        .await
        .with_context(|| format!("Renderer '{}' failed", renderer.name()))?;

    Ok(RenderedBoard { _dir: dir, path })
}

/// Result of a generate run
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub digest: ContentDigest,
    pub artifact_path: PathBuf,
    /// False when an identical image was already stored
    pub artifact_created: bool,
    pub record: Record,
    pub upsert: Upsert,
}

/// Produces boards and records them
pub struct BoardGenerator {
    catalog: CatalogStore,
    content: ContentStore,
}

impl BoardGenerator {
    pub fn new(catalog: CatalogStore, content: ContentStore) -> Self {
        Self { catalog, content }
    }

    /// Render (or read) a board, store it under its digest and upsert its record
    #[instrument(skip(self, spec, source), fields(width = spec.width, length = spec.length, dictionary = %spec.dictionary))]
    pub async fn generate(
        &self,
        spec: &BoardSpec,
        size: ImageSize,
        source: BoardSource<'_>,
    ) -> Result<GenerateOutcome> {
        spec.validate()?;
        spec.layout(size)?;

        let artifact = match source {
            BoardSource::Render(renderer) => {
                let rendered = render_board(renderer, spec, size, self.content.dir()).await?;
                Artifact::new(read_image(rendered.path()).await?, ImageFormat::Png)
            }
            BoardSource::File(path) => {
                // Content sniffing wins; the extension only breaks ties
                let fallback = ImageFormat::from_path(&path).unwrap_or(ImageFormat::Png);
                Artifact::new(read_image(&path).await?, fallback)
            }
        };

        let stored = self.content.put(&artifact).await?;

        let record = Record::for_digest(&stored.digest).with_params(spec.to_params(size));
        let upsert = self
            .catalog
            .upsert(record.clone())
            .await
            .with_context(|| format!("Failed to update catalog {}", self.catalog.path().display()))?;

        info!(
            digest = %stored.digest.short(),
            path = %stored.path.display(),
            inserted = upsert.is_insert(),
            "Board generated"
        );

        Ok(GenerateOutcome {
            digest: stored.digest,
            artifact_path: stored.path,
            artifact_created: stored.created,
            record,
            upsert,
        })
    }
}

async fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read board image: {}", path.display()))?;

    if bytes.is_empty() {
        anyhow::bail!("Board image is empty: {}", path.display());
    }

    Ok(bytes)
}
