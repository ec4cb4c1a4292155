//! Image embed rewriting.
//!
//! Local images referenced as `![alt](path)` are copied into the asset store
//! as `<document stem>_<image name>` and the embed is pointed at the copy.
//! Two documents with the same stem embedding images with the same name
//! share one asset file; the later copy wins.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};

use super::TransformError;
use crate::config::paths;

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// Copy local images referenced by `body` and retarget their embeds.
///
/// Missing images are logged and left as written. A failed copy fails the
/// whole document.
pub async fn rewrite_images(
    body: &str,
    document: &Path,
    assets_dir: &Path,
) -> Result<String, TransformError> {
    let source_dir = document.parent().unwrap_or(Path::new("."));
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = String::with_capacity(body.len());
    let mut last = 0;

    for caps in IMAGE_RE.captures_iter(body) {
        let (Some(whole), Some(alt), Some(target)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        out.push_str(&body[last..whole.start()]);
        last = whole.end();

        match localize_image(target.as_str(), source_dir, &stem, assets_dir).await? {
            Some(url) => {
                out.push_str("![");
                out.push_str(alt.as_str());
                out.push_str("](");
                out.push_str(&url);
                out.push(')');
            }
            None => out.push_str(whole.as_str()),
        }
    }

    out.push_str(&body[last..]);
    Ok(out)
}

/// Copy one referenced image into the asset store, returning its new URL.
/// `None` means the embed should stay unchanged.
async fn localize_image(
    target: &str,
    source_dir: &Path,
    stem: &str,
    assets_dir: &Path,
) -> Result<Option<String>, TransformError> {
    if is_remote(target) {
        return Ok(None);
    }

    let relative = target.strip_prefix("./").unwrap_or(target);
    let image_path = source_dir.join(relative);

    if !image_path.is_file() {
        warn!(path = %image_path.display(), "Image not found");
        return Ok(None);
    }
    let Some(image_name) = image_path.file_name() else {
        return Ok(None);
    };

    let asset_name = format!("{}_{}", stem, image_name.to_string_lossy());
    let asset_path = assets_dir.join(&asset_name);

    fs::copy(&image_path, &asset_path)
        .await
        .map_err(|source| TransformError::CopyImage {
            from: image_path.clone(),
            to: asset_path.clone(),
            source,
        })?;
    debug!(from = %image_path.display(), to = %asset_path.display(), "Copied image");

    Ok(Some(paths::asset_url(&asset_name)))
}

fn is_remote(target: &str) -> bool {
    ["http://", "https://", "data:"]
        .iter()
        .any(|scheme| target.starts_with(scheme))
}
