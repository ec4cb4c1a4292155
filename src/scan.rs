//! Source document discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::MatchOptions;
use tracing::{info, warn};

/// Find every `*.<extension>` file under `root`, recursively.
///
/// Hidden files and directories are skipped. The result is sorted so logs
/// are reproducible; nothing downstream depends on the order.
pub fn scan_documents(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", root.display());
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        glob::Pattern::escape(extension.trim_start_matches('.'))
    );
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut documents = Vec::new();
    let entries = glob::glob_with(&pattern, options)
        .with_context(|| format!("Invalid source pattern: {}", pattern))?;

    for entry in entries {
        match entry {
            Ok(path) if is_hidden(root, &path) => {}
            Ok(path) if path.is_file() => documents.push(path),
            Ok(_) => {}
            Err(e) => warn!(path = %e.path().display(), "Skipping unreadable entry: {}", e.error()),
        }
    }

    documents.sort();
    info!("Found {} source documents", documents.len());

    Ok(documents)
}

fn is_hidden(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        })
        .unwrap_or(false)
}
