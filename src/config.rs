//! Configuration for postdb paths and build settings.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (--source, --db), which clap also fills from
//!    the POSTDB_SOURCE / POSTDB_DB environment variables
//! 2. Config file (.postdb/config.yaml)
//! 3. Defaults (./posts, ./db)
//!
//! Config file discovery:
//! - An explicit --config path wins
//! - Otherwise searches current directory and parents for .postdb/config.yaml
//! - Paths in config file are relative to the project root (parent of .postdb/)

pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory that holds the config file inside a project
pub const CONFIG_DIR: &str = ".postdb";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_SOURCE_DIR: &str = "posts";
const DEFAULT_DB_DIR: &str = "db";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub build: Option<BuildConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Root of the Markdown source tree (relative to project root)
    pub source: Option<String>,
    /// Output directory for the JSON database (relative to project root)
    pub db: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    pub extension: Option<String>,
    pub posts_per_page: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Root of the source document tree
    pub source_dir: PathBuf,
    /// Output directory (aggregate, per-post files, index pages, assets)
    pub db_dir: PathBuf,
    /// Path to config file (if one was used)
    pub config_file: Option<PathBuf>,
    /// Build settings
    pub build: BuildSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Extension of source documents, without the leading dot
    pub extension: String,
    pub posts_per_page: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            posts_per_page: 10,
        }
    }
}

impl ResolvedConfig {
    /// Configuration for an explicit source/db pair with default build settings
    pub fn new(source_dir: impl Into<PathBuf>, db_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            db_dir: db_dir.into(),
            config_file: None,
            build: BuildSettings::default(),
        }
    }
}

/// Values supplied on the command line (or via their environment fallbacks)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub db_dir: Option<PathBuf>,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Directory that relative paths in a config file are resolved against.
///
/// For `<root>/.postdb/config.yaml` that is `<root>`; for a config file
/// anywhere else it is the file's own directory.
fn project_root(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new("."));
    if parent.file_name().is_some_and(|name| name == CONFIG_DIR) {
        parent.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

/// Resolve a path that may be relative to the project root or start with `~/`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(&path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources, discovering config files from the
/// current directory
pub fn load_config(overrides: &Overrides) -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    resolve_config(overrides, &cwd)
}

fn resolve_config(overrides: &Overrides, cwd: &Path) -> Result<ResolvedConfig> {
    let config_file = match &overrides.config_file {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        }
        None => find_config_file(cwd),
    };

    let (file_source, file_db, build) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;
        let base_dir = project_root(config_path);

        let source = config
            .paths
            .source
            .as_deref()
            .map(|p| resolve_path(&base_dir, p));
        let db = config.paths.db.as_deref().map(|p| resolve_path(&base_dir, p));

        let defaults = BuildSettings::default();
        let build = BuildSettings {
            extension: config
                .build
                .as_ref()
                .and_then(|b| b.extension.as_deref())
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(defaults.extension),
            posts_per_page: config
                .build
                .as_ref()
                .and_then(|b| b.posts_per_page)
                .unwrap_or(defaults.posts_per_page),
        };

        (source, db, build)
    } else {
        (None, None, BuildSettings::default())
    };

    if build.posts_per_page == 0 {
        anyhow::bail!("build.posts_per_page must be at least 1");
    }
    if build.extension.is_empty() {
        anyhow::bail!("build.extension must not be empty");
    }

    let source_dir = overrides
        .source_dir
        .clone()
        .or(file_source)
        .unwrap_or_else(|| cwd.join(DEFAULT_SOURCE_DIR));

    let db_dir = overrides
        .db_dir
        .clone()
        .or(file_db)
        .unwrap_or_else(|| cwd.join(DEFAULT_DB_DIR));

    Ok(ResolvedConfig {
        source_dir,
        db_dir,
        config_file,
        build,
    })
}
