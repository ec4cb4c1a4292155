//! postdb - Markdown to JSON post database builder
//!
//! Converts a directory tree of Markdown documents into a denormalized JSON
//! database that a static site can serve as-is.
//!
//! # Architecture
//!
//! A single sequential pipeline:
//! - Load the previous run's aggregate file into a [`Catalog`]
//! - Scan the source tree for documents
//! - Transform each unseen document (by content hash) into a [`Record`],
//!   copying images and rewriting links
//! - Write the aggregate, one file per post, and paginated index pages
//!
//! # Modules
//!
//! - `catalog`: Records, ids, slugs, and loading the aggregate file
//! - `scan`: Source document discovery
//! - `transform`: Image and link rewriting
//! - `writer`: JSON output
//! - `pipeline`: The build driver
//! - `config`: Configuration and output layout
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Build (or update) the database
//! postdb build --source ./posts --db ./site/db
//!
//! # List what it holds
//! postdb list --db ./site/db
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod scan;
pub mod transform;
pub mod writer;

// Re-export main types at crate root for convenience
pub use catalog::{Catalog, PostId, Record};
pub use config::ResolvedConfig;
pub use pipeline::{build, BuildSummary};
pub use transform::{Outcome, TransformError, Transformer};
pub use writer::{CatalogWriter, IndexPage};
