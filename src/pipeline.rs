//! The build pipeline: load → scan → transform → write.

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::{paths, ResolvedConfig};
use crate::scan::scan_documents;
use crate::transform::{Outcome, Transformer};
use crate::writer::CatalogWriter;

/// What a build did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Documents found by the scanner
    pub scanned: usize,
    /// New posts added to the catalog
    pub created: usize,
    /// Documents whose content was already cataloged
    pub duplicates: usize,
    /// Documents that could not be processed
    pub failed: usize,
    /// Posts in the catalog after the run
    pub total_posts: usize,
    /// Index pages written (0 when nothing was written)
    pub pages: usize,
}

/// Run one full build.
///
/// Per-document failures are logged and counted; only a missing source
/// directory or an unwritable db directory aborts the run. When the scan
/// finds nothing, no output is touched.
pub async fn build(config: &ResolvedConfig) -> Result<BuildSummary> {
    info!(
        source = %config.source_dir.display(),
        db = %config.db_dir.display(),
        "Starting build"
    );

    let assets_dir = paths::assets_dir(&config.db_dir);
    fs::create_dir_all(&assets_dir)
        .await
        .with_context(|| format!("Failed to create asset directory: {}", assets_dir.display()))?;

    let mut catalog = Catalog::load(&paths::aggregate_file(&config.db_dir)).await;

    let documents = scan_documents(&config.source_dir, &config.build.extension)?;
    let mut summary = BuildSummary {
        scanned: documents.len(),
        ..Default::default()
    };

    if documents.is_empty() {
        warn!("No source documents found, leaving output untouched");
        summary.total_posts = catalog.len();
        return Ok(summary);
    }

    let transformer = Transformer::new(assets_dir);
    for path in &documents {
        match transformer.process(path, &catalog).await {
            Ok(Outcome::Created(record)) => {
                info!(id = %record.id.short(), title = %record.title, "Processed new post");
                catalog.insert(record);
                summary.created += 1;
            }
            Ok(Outcome::Duplicate(id)) => {
                info!(id = %id.short(), path = %path.display(), "Skipping already processed document");
                summary.duplicates += 1;
            }
            Err(e) => {
                error!(path = %path.display(), "Error processing document: {}", e);
                summary.failed += 1;
            }
        }
    }

    info!("Processed {} new posts", summary.created);

    let writer = CatalogWriter::new(&config.db_dir, config.build.posts_per_page);
    let written = writer.write_all(&mut catalog).await?;

    summary.total_posts = written.total_posts;
    summary.pages = written.pages;

    info!(
        created = summary.created,
        duplicates = summary.duplicates,
        failed = summary.failed,
        total = summary.total_posts,
        "Build complete"
    );

    Ok(summary)
}
