//! Filesystem helpers.

use std::path::Path;
use tokio::fs;

/// Ensure the parent directory of `path` exists, creating it if needed.
pub async fn ensure_parent_dir(path: impl AsRef<Path>) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
