use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("failed to read {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recursively copy `source` into `destination`, preserving relative paths.
///
/// Returns the number of files copied. A missing source copies nothing.
pub async fn copy_assets(source: &Path, destination: &Path) -> Result<usize, AssetError> {
    if !source.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| AssetError::Walk {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source.to_path_buf()),
            source: e,
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        let copy_error = |e| AssetError::Copy {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source: e,
        };

        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target).await.map_err(copy_error)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(copy_error)?;
            }
            tokio::fs::copy(entry.path(), &target)
                .await
                .map_err(copy_error)?;
            copied += 1;
        }
    }

    Ok(copied)
}
