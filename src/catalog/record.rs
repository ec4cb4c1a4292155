//! Post records and their identifiers.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Post identifier (hex SHA256 of the raw document bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(String);

impl PostId {
    /// Create a post ID from document content
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for logs and listings
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One converted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Content hash, the deduplication key
    pub id: PostId,

    /// File name without its extension
    pub title: String,

    /// Same as `content`; the site decides how much of it to show
    #[serde(default)]
    pub excerpt: String,

    /// Body after image and link rewriting
    #[serde(default)]
    pub content: String,

    /// Original base file name
    #[serde(default)]
    pub filename: String,

    /// URL token; empty only for legacy records awaiting backfill
    #[serde(default)]
    pub slug: String,

    /// When the document was first processed
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,

    /// Fields written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Create a record for a freshly transformed document
    pub fn new(
        id: PostId,
        title: impl Into<String>,
        filename: impl Into<String>,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        let slug = slugify(&title, created_at);

        Self {
            id,
            title,
            excerpt: content.clone(),
            content,
            filename: filename.into(),
            slug,
            created_at,
            updated_at: created_at,
            extra: Map::new(),
        }
    }

    /// Derive the slug if missing. Returns true when one was added.
    pub fn ensure_slug(&mut self) -> bool {
        if !self.slug.is_empty() {
            return false;
        }
        self.slug = slugify(&self.title, self.created_at);
        true
    }
}

/// Build a slug from a title and the date of `created_at`.
///
/// Lowercases, maps spaces and underscores to dashes, drops anything outside
/// `[a-z0-9-]`, collapses and trims dashes, then appends `-YYYYMMDD`.
pub fn slugify(title: &str, created_at: DateTime<Utc>) -> String {
    let mut slug = String::with_capacity(title.len() + 9);

    for ch in title.to_lowercase().chars() {
        let ch = match ch {
            ' ' | '_' => '-',
            other => other,
        };

        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-') {
            continue;
        }
        if ch == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(ch);
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    let stamp = created_at.format("%Y%m%d");
    if slug.is_empty() {
        stamp.to_string()
    } else {
        format!("{}-{}", slug, stamp)
    }
}

/// Format a timestamp the way every output file stores it
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one (taken as UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Ok(at.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()),
    }
}

/// Serde adapter for [`format_timestamp`] / [`parse_timestamp`]
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(*at))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_post_id_from_bytes() {
        let id1 = PostId::from_bytes(b"# Hello\n");
        let id2 = PostId::from_bytes(b"# Hello\n");
        let id3 = PostId::from_bytes(b"# Hello!\n");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1.as_str().len(), 64);
        assert_eq!(id1.short().len(), 12);
        assert_eq!(
            PostId::from_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_slugify_punctuation() {
        let slug = slugify("Hello, World!", at(2024, 3, 7));
        assert_eq!(slug, "hello-world-20240307");
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(!slug.contains("--"));
    }

    #[test]
    fn test_slugify_collapses_and_trims_dashes() {
        assert_eq!(
            slugify("  My__Great - Post  ", at(2025, 12, 31)),
            "my-great-post-20251231"
        );
        assert_eq!(slugify("-a-!-b-", at(2025, 1, 2)), "a-b-20250102");
    }

    #[test]
    fn test_slugify_without_usable_characters() {
        assert_eq!(slugify("¿¡!", at(2025, 1, 2)), "20250102");
    }

    #[test]
    fn test_record_new() {
        let created = at(2024, 1, 1);
        let record = Record::new(
            PostId::from_bytes(b"x"),
            "First Post",
            "First Post.md",
            "body".to_string(),
            created,
        );

        assert_eq!(record.excerpt, record.content);
        assert_eq!(record.slug, "first-post-20240101");
        assert_eq!(record.updated_at, record.created_at);
    }

    #[test]
    fn test_legacy_record_deserializes() {
        let json = r#"{
            "id": "abc",
            "title": "Old Post",
            "excerpt": "e",
            "content": "c",
            "filename": "Old Post.md",
            "created_at": "2023-05-01T10:00:00.123456",
            "updated_at": "2023-05-01T10:00:00.123456",
            "views": 42
        }"#;

        let mut record: Record = serde_json::from_str(json).unwrap();
        assert!(record.slug.is_empty());
        assert_eq!(record.created_at.format("%Y%m%d").to_string(), "20230501");
        assert_eq!(record.extra.get("views"), Some(&Value::from(42)));

        assert!(record.ensure_slug());
        assert_eq!(record.slug, "old-post-20230501");
        assert!(!record.ensure_slug());

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["views"], 42);
        assert_eq!(out["created_at"], "2023-05-01T10:00:00.123456Z");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-01-01T00:00:00Z").is_ok());
        assert!(parse_timestamp("2024-01-01T00:00:00+02:00").is_ok());
        assert!(parse_timestamp("2024-01-01T00:00:00").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
