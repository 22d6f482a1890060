//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative to the studies root)
//! - Slugs (the site-wide identifier of a study)
//! - URL paths and output file paths derived from a slug

use std::path::{Path, PathBuf};

/// Convert a studies-root-relative markdown path to a slug.
///
/// # Examples
/// ```ignore
/// source_path_to_slug("quicksort.md") => "quicksort"
/// source_path_to_slug("algorithms/sorting/quicksort.md") => "algorithms/sorting/quicksort"
/// ```
pub fn source_path_to_slug(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    let path_str = path_str.strip_suffix(".md").unwrap_or(&path_str);
    path_str.replace('\\', "/")
}

/// Convert a slug to the absolute URL of its page.
///
/// ```ignore
/// slug_to_url("trees/bst") => "/trees/bst.html"
/// ```
pub fn slug_to_url(slug: &str) -> String {
    format!("/{}.html", slug)
}

/// Convert a slug to the file its page is written to.
///
/// ```ignore
/// slug_to_output_path("trees/bst", "/site") => "/site/trees/bst.html"
/// ```
pub fn slug_to_output_path(slug: &str, output_dir: &Path) -> PathBuf {
    // Append rather than set_extension: slugs may contain dots
    let mut path = output_dir.to_path_buf();
    for part in slug.split('/').filter(|part| !part.is_empty()) {
        path.push(part);
    }
    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(".html");
    path.set_file_name(file_name);
    path
}

/// Whether a study with this slug would be overwritten by generated output:
/// `index` becomes the site's `index.html`, and anything under `assets/`
/// lands in the copied assets directory.
pub fn is_reserved_slug(slug: &str) -> bool {
    slug == "index" || slug.starts_with("assets/")
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
