//! Persisting the catalog as JSON.
//!
//! Every run regenerates all derived files from the in-memory catalog:
//! the aggregate file, one file per post, and the paginated index. Stale
//! per-post and index files are deleted first so removed pages do not
//! linger.

pub mod pages;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::catalog::{format_timestamp, Catalog, Record};
use crate::config::paths;

pub use pages::{paginate, IndexEntry, IndexPage};

/// Aggregate file contents
#[derive(Debug, Serialize)]
struct AggregateFile<'a> {
    posts: &'a [Record],
    total_posts: usize,
    last_updated: &'a str,
}

/// Per-post file contents
#[derive(Debug, Serialize)]
struct RecordFile<'a> {
    post: &'a Record,
    last_updated: &'a str,
}

/// What a full write produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Posts in the aggregate file
    pub total_posts: usize,
    /// Legacy posts that were given a slug during this write
    pub slugs_backfilled: usize,
    /// Per-post files written
    pub record_files: usize,
    /// Index pages written
    pub pages: usize,
}

/// Writes the catalog into a db directory
pub struct CatalogWriter {
    /// Output directory
    db_dir: PathBuf,

    /// Posts per index page (at least 1)
    posts_per_page: usize,
}

impl CatalogWriter {
    /// Create a writer for `db_dir`; a page size of 0 is treated as 1
    pub fn new(db_dir: impl Into<PathBuf>, posts_per_page: usize) -> Self {
        Self {
            db_dir: db_dir.into(),
            posts_per_page: posts_per_page.max(1),
        }
    }

    /// Backfill missing slugs, then write aggregate, per-post files and index
    pub async fn write_all(&self, catalog: &mut Catalog) -> Result<WriteSummary> {
        fs::create_dir_all(&self.db_dir)
            .await
            .with_context(|| format!("Failed to create db directory: {}", self.db_dir.display()))?;

        let slugs_backfilled = catalog.backfill_slugs();
        if slugs_backfilled > 0 {
            info!("Backfilled slugs for {} legacy posts", slugs_backfilled);
        }

        let last_updated = format_timestamp(Utc::now());
        self.write_aggregate(catalog, &last_updated).await?;
        let record_files = self.write_records(catalog, &last_updated).await?;
        let pages = self.write_index(catalog, &last_updated).await?;

        Ok(WriteSummary {
            total_posts: catalog.len(),
            slugs_backfilled,
            record_files,
            pages,
        })
    }

    /// Overwrite the aggregate file with every post
    pub async fn write_aggregate(&self, catalog: &Catalog, last_updated: &str) -> Result<PathBuf> {
        let path = paths::aggregate_file(&self.db_dir);
        let aggregate = AggregateFile {
            posts: catalog.records(),
            total_posts: catalog.len(),
            last_updated,
        };

        write_json(&path, &aggregate).await?;
        info!("Saved database with {} posts", catalog.len());

        Ok(path)
    }

    /// Replace all per-post files. Returns how many were written.
    pub async fn write_records(&self, catalog: &Catalog, last_updated: &str) -> Result<usize> {
        let removed = remove_matching(&paths::record_file_pattern(&self.db_dir)).await?;
        debug!("Deleted {} old post files", removed);

        for record in catalog.records() {
            let path = paths::record_file(&self.db_dir, &record.id);
            write_json(&path, &RecordFile { post: record, last_updated }).await?;
        }

        info!("Wrote {} post files", catalog.len());
        Ok(catalog.len())
    }

    /// Replace all index pages. Returns how many pages were written.
    pub async fn write_index(&self, catalog: &Catalog, last_updated: &str) -> Result<usize> {
        let first_page = paths::index_page_file(&self.db_dir, 1);
        if first_page.exists() {
            fs::remove_file(&first_page)
                .await
                .with_context(|| format!("Failed to delete {}", first_page.display()))?;
        }
        let removed = remove_matching(&paths::index_page_pattern(&self.db_dir)).await?;
        debug!("Deleted {} old index pages", removed);

        let ordered = catalog.newest_first();
        let pages = paginate(&ordered, self.posts_per_page, last_updated);

        for page in &pages {
            let path = paths::index_page_file(&self.db_dir, page.page);
            write_json(&path, page).await?;
            debug!(path = %path.display(), posts = page.posts.len(), "Wrote index page");
        }

        info!("Wrote {} index pages", pages.len());
        Ok(pages.len())
    }
}

/// Delete every file matching a glob pattern
async fn remove_matching(pattern: &str) -> Result<usize> {
    let entries = glob::glob(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;

    let mut removed = 0;
    for entry in entries {
        let path = entry.with_context(|| format!("Failed to list {}", pattern))?;
        fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete {}", path.display()))?;
        removed += 1;
    }

    Ok(removed)
}

/// Pretty-printed UTF-8 JSON, two-space indent
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PostId;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn catalog_of(n: usize) -> Catalog {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Catalog::from_records((0..n).map(|i| {
            let body = format!("post {}", i);
            Record::new(
                PostId::from_bytes(body.as_bytes()),
                body.clone(),
                format!("{}.md", body),
                body,
                base + Duration::hours(i as i64),
            )
        }))
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_write_all_layout() {
        let temp = TempDir::new().unwrap();
        let writer = CatalogWriter::new(temp.path(), 10);
        let mut catalog = catalog_of(25);

        let summary = writer.write_all(&mut catalog).await.unwrap();
        assert_eq!(summary.total_posts, 25);
        assert_eq!(summary.record_files, 25);
        assert_eq!(summary.pages, 3);

        let aggregate = read_json(&temp.path().join("posts.db"));
        assert_eq!(aggregate["total_posts"], 25);
        assert_eq!(aggregate["posts"].as_array().unwrap().len(), 25);

        let first = catalog.records()[0].clone();
        let post_file = read_json(&temp.path().join(format!("post_{}.json", first.id)));
        assert_eq!(post_file["post"]["title"], "post 0");
        assert!(post_file["last_updated"].is_string());

        let index = read_json(&temp.path().join("index.json"));
        assert_eq!(index["page"], 1);
        assert_eq!(index["posts"][0]["title"], "post 24");
        assert!(temp.path().join("index_2.json").exists());
        let last = read_json(&temp.path().join("index_3.json"));
        assert_eq!(last["posts"].as_array().unwrap().len(), 5);
        assert_eq!(last["has_next"], false);
        assert!(last["next_page"].is_null());
    }

    #[tokio::test]
    async fn test_stale_files_are_removed() {
        let temp = TempDir::new().unwrap();
        let writer = CatalogWriter::new(temp.path(), 10);
        std::fs::write(temp.path().join("post_stale.json"), "{}").unwrap();
        std::fs::write(temp.path().join("index_7.json"), "{}").unwrap();

        writer.write_all(&mut catalog_of(3)).await.unwrap();

        assert!(!temp.path().join("post_stale.json").exists());
        assert!(!temp.path().join("index_7.json").exists());
        assert!(temp.path().join("index.json").exists());
        assert!(!temp.path().join("index_2.json").exists());
    }

    #[tokio::test]
    async fn test_empty_catalog_writes_no_pages() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.json"), "{}").unwrap();
        let writer = CatalogWriter::new(temp.path(), 10);

        let summary = writer.write_all(&mut Catalog::new()).await.unwrap();

        assert_eq!(summary.pages, 0);
        assert!(!temp.path().join("index.json").exists());
        assert_eq!(read_json(&temp.path().join("posts.db"))["total_posts"], 0);
    }

    #[tokio::test]
    async fn test_backfilled_slug_reaches_aggregate() {
        let temp = TempDir::new().unwrap();
        let writer = CatalogWriter::new(temp.path(), 10);
        let mut legacy = catalog_of(1).records()[0].clone();
        legacy.slug.clear();
        let mut catalog = Catalog::from_records(vec![legacy]);

        let summary = writer.write_all(&mut catalog).await.unwrap();
        assert_eq!(summary.slugs_backfilled, 1);

        let aggregate = read_json(&temp.path().join("posts.db"));
        assert_eq!(aggregate["posts"][0]["slug"], "post-0-20240101");
        let index = read_json(&temp.path().join("index.json"));
        assert_eq!(index["posts"][0]["slug"], "post-0-20240101");
    }

    #[tokio::test]
    async fn test_zero_page_size_writes_one_post_per_page() {
        let temp = TempDir::new().unwrap();
        let writer = CatalogWriter::new(temp.path(), 0);

        let summary = writer.write_all(&mut catalog_of(2)).await.unwrap();

        assert_eq!(summary, WriteSummary {
            total_posts: 2,
            slugs_backfilled: 0,
            record_files: 2,
            pages: 2,
        });
        assert_eq!(read_json(&temp.path().join("index_2.json"))["posts_per_page"], 1);
    }
}
