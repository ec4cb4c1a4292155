//! Turning source documents into catalog records.
//!
//! For each document the transformer hashes the raw bytes, skips it if the
//! catalog already holds that hash, and otherwise rewrites image embeds and
//! links before assembling a [`Record`].

pub mod images;
pub mod links;

use std::path::{Path, PathBuf};

use chrono::{SubsecRound, Utc};
use thiserror::Error;
use tokio::fs;

use crate::catalog::{Catalog, PostId, Record};

pub use images::rewrite_images;
pub use links::rewrite_links;

/// Errors that fail a single document
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },

    #[error("Failed to copy image {} to {}: {source}", from.display(), to.display())]
    CopyImage {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one document
#[derive(Debug, Clone)]
pub enum Outcome {
    /// New content, ready to be added to the catalog
    Created(Record),

    /// The catalog already holds a post with this content
    Duplicate(PostId),
}

/// Converts documents, copying their images into the asset store
pub struct Transformer {
    assets_dir: PathBuf,
}

impl Transformer {
    /// Create a transformer writing images to `assets_dir` (must exist)
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    /// Process one document against the current catalog
    pub async fn process(&self, path: &Path, catalog: &Catalog) -> Result<Outcome, TransformError> {
        let bytes = fs::read(path).await.map_err(|source| TransformError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let id = PostId::from_bytes(&bytes);
        if catalog.contains(&id) {
            return Ok(Outcome::Duplicate(id));
        }

        let body = String::from_utf8(bytes).map_err(|_| TransformError::NotUtf8 {
            path: path.to_path_buf(),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let content = rewrite_images(&body, path, &self.assets_dir).await?;
        let content = rewrite_links(&content);

        Ok(Outcome::Created(Record::new(
            id,
            title,
            filename,
            content,
            // Stored timestamps carry microseconds; keep memory and disk equal
            Utc::now().trunc_subsecs(6),
        )))
    }
}
