//! Canonical file layout of the post database.
//!
//! Single source of truth - import this instead of hardcoding file names.
//!
//! ```text
//! <db>/
//! ├── posts.db                  # Aggregate of every post (JSON)
//! ├── post_<id>.json            # One file per post
//! ├── index.json                # Index page 1 (newest posts)
//! ├── index_<n>.json            # Index pages 2..n
//! └── assets/images/posts/      # Copied images, <doc stem>_<image name>
//! ```

use std::path::{Path, PathBuf};

use crate::catalog::PostId;

/// Aggregate file holding every post
pub const AGGREGATE_FILE: &str = "posts.db";

/// First index page
pub const INDEX_FILE: &str = "index.json";

/// Asset store, relative to the db directory
pub const ASSETS_SUBDIR: &str = "assets/images/posts";

/// Prefix under which the site serves copied images
pub const ASSET_URL_PREFIX: &str = "db/assets/images/posts";

/// Get the aggregate file path (<db>/posts.db)
pub fn aggregate_file(db_dir: &Path) -> PathBuf {
    db_dir.join(AGGREGATE_FILE)
}

/// Get the per-post file path (<db>/post_<id>.json)
pub fn record_file(db_dir: &Path, id: &PostId) -> PathBuf {
    db_dir.join(format!("post_{}.json", id))
}

/// Glob matching every per-post file in the db directory
pub fn record_file_pattern(db_dir: &Path) -> String {
    format!("{}/post_*.json", escaped(db_dir))
}

/// Get the path of a 1-based index page; page 1 is `index.json`
pub fn index_page_file(db_dir: &Path, page: usize) -> PathBuf {
    if page <= 1 {
        db_dir.join(INDEX_FILE)
    } else {
        db_dir.join(format!("index_{}.json", page))
    }
}

/// Glob matching index pages 2..n in the db directory
pub fn index_page_pattern(db_dir: &Path) -> String {
    format!("{}/index_*.json", escaped(db_dir))
}

/// Get the asset store directory (<db>/assets/images/posts)
pub fn assets_dir(db_dir: &Path) -> PathBuf {
    db_dir.join(ASSETS_SUBDIR)
}

/// URL a rewritten image embed points at
pub fn asset_url(asset_name: &str) -> String {
    format!("{}/{}", ASSET_URL_PREFIX, asset_name)
}

fn escaped(dir: &Path) -> String {
    glob::Pattern::escape(&dir.to_string_lossy())
}
