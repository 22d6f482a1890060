use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum FeaturedError {
    #[error("failed to read featured manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse featured manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An entry of the featured manifest: a study to highlight and why.
///
/// Resolved against the processed studies by slug; entries without a
/// matching study are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeaturedStudy {
    pub slug: String,
    pub reason: String,
}

/// Load the featured manifest, a JSON list of `{ "slug": ..., "reason": ... }`.
///
/// Returns an empty list if the file doesn't exist.
pub async fn load_featured(path: &Path) -> Result<Vec<FeaturedStudy>, FeaturedError> {
    let io_error = |source| FeaturedError::Io {
        path: path.to_path_buf(),
        source,
    };

    if !tokio::fs::try_exists(path).await.map_err(io_error)? {
        return Ok(Vec::new());
    }

    let content = tokio::fs::read_to_string(path).await.map_err(io_error)?;
    serde_json::from_str(&content).map_err(|source| FeaturedError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
