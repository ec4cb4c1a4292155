//! Post catalog: the set of processed records.
//!
//! The catalog is loaded from the previous run's aggregate file, grown with
//! newly processed documents, and handed to the writer. Records are keyed by
//! the SHA256 of their source bytes, so re-running over unchanged sources
//! adds nothing.

pub mod record;
pub mod store;

pub use record::{format_timestamp, parse_timestamp, slugify, PostId, Record};
pub use store::Catalog;
