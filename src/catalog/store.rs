//! The in-memory catalog and its loader.
//!
//! The catalog keeps records in insertion order (loaded records first, in
//! file order, then new ones as they are processed) with an id index on the
//! side. Records are never replaced or removed.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tokio::fs;
use tracing::{error, info, warn};

use super::record::{PostId, Record};

/// Catalog of all processed posts
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<Record>,
    index: HashMap<PostId, usize>,
}

/// Shape of the aggregate file as far as loading cares
#[derive(Debug, Deserialize)]
struct StoredAggregate {
    #[serde(default)]
    posts: Vec<Record>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records; the first record wins on duplicate ids
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            if !catalog.insert(record) {
                warn!("Dropping duplicate post id found in existing catalog");
            }
        }
        catalog
    }

    /// Load the aggregate file at `path`.
    ///
    /// A missing file yields an empty catalog. An unreadable or malformed one
    /// is logged, copied aside, and also yields an empty catalog.
    pub async fn load(path: &Path) -> Self {
        match read_aggregate(path).await {
            Ok(Some(records)) => {
                let catalog = Self::from_records(records);
                info!("Loaded {} existing posts", catalog.len());
                catalog
            }
            Ok(None) => {
                info!(path = %path.display(), "No existing catalog, starting empty");
                Self::new()
            }
            Err(e) => {
                error!(path = %path.display(), "Error loading existing catalog: {:#}", e);
                preserve_unreadable(path).await;
                Self::new()
            }
        }
    }

    /// Add a record. Returns false (and keeps the existing one) if the id
    /// is already present.
    pub fn insert(&mut self, record: Record) -> bool {
        if self.index.contains_key(&record.id) {
            return false;
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Check whether a post with this id exists
    pub fn contains(&self, id: &PostId) -> bool {
        self.index.contains_key(id)
    }

    /// Get a post by ID
    pub fn get(&self, id: &PostId) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// All records in insertion order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Give every record without a slug one derived from its title.
    /// Returns how many were filled in.
    pub fn backfill_slugs(&mut self) -> usize {
        self.records
            .iter_mut()
            .map(|record| record.ensure_slug())
            .filter(|&added| added)
            .count()
    }

    /// All records sorted by created_at (most recent first). The sort is
    /// stable, so equal timestamps keep insertion order.
    pub fn newest_first(&self) -> Vec<&Record> {
        let mut records: Vec<_> = self.records.iter().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Get the most recent posts, optionally limited
    pub fn list(&self, limit: Option<usize>) -> Vec<&Record> {
        let mut records = self.newest_first();

        if let Some(limit) = limit {
            records.truncate(limit);
        }

        records
    }

    /// Get the number of posts
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

async fn read_aggregate(path: &Path) -> Result<Option<Vec<Record>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

    let stored: StoredAggregate =
        serde_json::from_str(&content).context("Failed to parse catalog JSON")?;

    Ok(Some(stored.posts))
}

/// Copy a catalog that failed to load next to itself before this run
/// overwrites it.
async fn preserve_unreadable(path: &Path) {
    let Some(name) = path.file_name() else {
        return;
    };
    let backup = path.with_file_name(format!(
        "{}.corrupt-{}",
        name.to_string_lossy(),
        Utc::now().format("%Y%m%d%H%M%S")
    ));

    match fs::copy(path, &backup).await {
        Ok(_) => warn!(backup = %backup.display(), "Kept a copy of the unreadable catalog"),
        Err(e) => warn!(path = %path.display(), "Could not keep a copy of the unreadable catalog: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn record(body: &str, minutes: i64) -> Record {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes);
        Record::new(
            PostId::from_bytes(body.as_bytes()),
            body,
            format!("{}.md", body),
            body.to_string(),
            created,
        )
    }

    #[test]
    fn test_catalog_insert_and_get() {
        let mut catalog = Catalog::new();
        let item = record("alpha", 0);
        let id = item.id.clone();

        assert!(catalog.insert(item));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains(&id));
        assert_eq!(catalog.get(&id).unwrap().title, "alpha");
    }

    #[test]
    fn test_insert_never_replaces() {
        let mut catalog = Catalog::new();
        let first = record("alpha", 0);
        let mut second = first.clone();
        second.title = "renamed".to_string();

        assert!(catalog.insert(first.clone()));
        assert!(!catalog.insert(second));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&first.id).unwrap().title, "alpha");
    }

    #[test]
    fn test_newest_first_is_stable() {
        let mut catalog = Catalog::new();
        catalog.insert(record("old", 0));
        catalog.insert(record("tie-a", 10));
        catalog.insert(record("tie-b", 10));
        catalog.insert(record("new", 20));

        let titles: Vec<_> = catalog.newest_first().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "tie-a", "tie-b", "old"]);

        assert_eq!(catalog.list(Some(2)).len(), 2);
    }

    #[test]
    fn test_backfill_slugs() {
        let mut legacy = record("Legacy Post", 0);
        legacy.slug.clear();
        let mut catalog = Catalog::from_records(vec![legacy.clone(), record("fresh", 1)]);

        assert_eq!(catalog.backfill_slugs(), 1);
        assert_eq!(catalog.get(&legacy.id).unwrap().slug, "legacy-post-20240601");
        assert_eq!(catalog.backfill_slugs(), 0);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::load(&temp.path().join("posts.db")).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_file_keeps_a_copy() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("posts.db");
        std::fs::write(&path, "{ not json").unwrap();

        let catalog = Catalog::load(&path).await;
        assert!(catalog.is_empty());

        let backups: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("posts.db.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[tokio::test]
    async fn test_load_keeps_file_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("posts.db");
        let posts = vec![record("b", 5), record("a", 1)];
        let json = serde_json::json!({ "posts": posts, "total_posts": 2 });
        std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

        let catalog = Catalog::load(&path).await;
        let titles: Vec<_> = catalog.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }
}
