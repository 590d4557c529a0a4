//! Utility functions for file operations and path manipulation

use crate::error::FetchError;
use std::path::{Path, PathBuf};

/// Deterministic file name for a downloaded post
///
/// # Examples
///
/// ```
/// use reel_relay::utils::media_file_name;
///
/// assert_eq!(media_file_name("instagram", 3, "C1a2B3"), "instagram_video_3_C1a2B3.mp4");
/// ```
#[must_use]
pub fn media_file_name(platform: &str, index: usize, shortcode: &str) -> String {
    format!("{platform}_video_{index}_{shortcode}.mp4")
}

/// Move a file, falling back to copy + delete when a rename crosses filesystems
pub async fn move_file(source: &Path, dest: &Path) -> Result<(), FetchError> {
    if source == dest {
        return Ok(());
    }

    let move_failed = |reason: String| FetchError::MoveFailed {
        source_path: source.to_path_buf(),
        dest_path: dest.to_path_buf(),
        reason,
    };

    match tokio::fs::rename(source, dest).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // EXDEV and friends: copy then remove the original
            tracing::debug!(
                source = %source.display(),
                dest = %dest.display(),
                error = %rename_err,
                "rename failed, falling back to copy"
            );
            tokio::fs::copy(source, dest)
                .await
                .map_err(|e| move_failed(format!("rename: {rename_err}; copy: {e}")))?;
            if let Err(e) = tokio::fs::remove_file(source).await {
                tracing::warn!(path = %source.display(), error = %e, "failed to remove source after copy");
            }
            Ok(())
        }
    }
}

/// Check that `path` is an existing regular file with at least one byte
///
/// Returns the file size on success.
pub async fn verify_nonempty(path: &Path) -> Result<u64, FetchError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        Ok(meta) if meta.is_file() => Err(FetchError::Empty {
            path: path.to_path_buf(),
        }),
        _ => Err(FetchError::Missing {
            path: path.to_path_buf(),
        }),
    }
}

/// Remove a file, logging instead of failing
///
/// Returns true if the file was removed.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
            false
        }
    }
}

/// Create `dir` (and parents) if it does not exist yet
pub async fn ensure_dir(dir: &Path) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(dir.to_path_buf())
}
