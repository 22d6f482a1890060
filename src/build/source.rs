use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::paths::source_path_to_slug;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("studies directory not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("studies path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// The directory tree holding the study documents.
pub struct StudySource {
    pub root: PathBuf,
}

impl StudySource {
    /// Resolve the studies root, failing if it does not exist or is not a directory.
    pub fn resolve(root: PathBuf) -> Result<Self, SourceError> {
        if !root.exists() {
            return Err(SourceError::PathNotFound(root));
        }
        if !root.is_dir() {
            return Err(SourceError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    /// Discover every markdown file under the root.
    ///
    /// Walks the whole tree, visiting entries sorted by file name so that the
    /// result is stable for a given filesystem state. Symlinked files and
    /// directories are followed; a link cycle is reported as an error.
    pub fn discover(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| SourceError::Walk {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone()),
                source: e,
            })?;

            if entry.file_type().is_file() && is_markdown(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Path of a discovered file relative to the studies root.
    pub fn relative_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Slug of a discovered file.
    pub fn slug_for(&self, path: &Path) -> String {
        source_path_to_slug(self.relative_path(path))
    }
}

fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".md"))
}
