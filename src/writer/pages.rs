//! Paginated index pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::record::timestamp;
use crate::catalog::{PostId, Record};

/// Lightweight projection of a record for index pages (no `content`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: PostId,
    pub title: String,
    pub excerpt: String,
    pub filename: String,
    pub slug: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<&Record> for IndexEntry {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            excerpt: record.excerpt.clone(),
            filename: record.filename.clone(),
            slug: record.slug.clone(),
            created_at: record.created_at,
        }
    }
}

/// One page of the index, as written to `index.json` / `index_<n>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPage {
    pub posts: Vec<IndexEntry>,
    /// 1-based page number
    pub page: usize,
    pub total_pages: usize,
    pub total_posts: usize,
    pub posts_per_page: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: Option<usize>,
    pub prev_page: Option<usize>,
    pub last_updated: String,
}

/// Number of pages needed for `total_posts`
pub fn page_count(total_posts: usize, posts_per_page: usize) -> usize {
    total_posts.div_ceil(posts_per_page)
}

/// Split already-ordered records into pages. An empty slice gives no pages.
///
/// `posts_per_page` must be non-zero.
pub fn paginate(records: &[&Record], posts_per_page: usize, last_updated: &str) -> Vec<IndexPage> {
    let total_posts = records.len();
    let total_pages = page_count(total_posts, posts_per_page);

    records
        .chunks(posts_per_page)
        .enumerate()
        .map(|(i, chunk)| {
            let page = i + 1;
            let has_next = page < total_pages;
            let has_prev = page > 1;

            IndexPage {
                posts: chunk.iter().map(|r| IndexEntry::from(*r)).collect(),
                page,
                total_pages,
                total_posts,
                posts_per_page,
                has_next,
                has_prev,
                next_page: has_next.then_some(page + 1),
                prev_page: has_prev.then_some(page - 1),
                last_updated: last_updated.to_string(),
            }
        })
        .collect()
}
