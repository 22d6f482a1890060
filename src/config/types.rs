use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// Site configuration, loaded from `studysite.yaml`.
///
/// Every section has defaults, so a project without a config file builds
/// from the conventional `src/` layout into `build/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Output directory; wiped and recreated on every build
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// strftime-style format used to display study dates
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_site_name() -> String {
    "Studies".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("build")
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            output: default_output(),
            date_format: default_date_format(),
        }
    }
}

// =============================================================================
// Input paths
// =============================================================================

/// Locations of the site inputs, relative to the config file's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the Markdown study tree
    #[serde(default = "default_studies")]
    pub studies: PathBuf,
    /// Directory holding `study.html` and `index.html`
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    /// Optional featured manifest
    #[serde(default = "default_featured")]
    pub featured: PathBuf,
    /// Optional assets directory, copied to `<output>/assets`
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
}

fn default_studies() -> PathBuf {
    PathBuf::from("src/studies")
}

fn default_templates() -> PathBuf {
    PathBuf::from("src/templates")
}

fn default_featured() -> PathBuf {
    PathBuf::from("src/featured-studies.json")
}

fn default_assets() -> PathBuf {
    PathBuf::from("src/assets")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            studies: default_studies(),
            templates: default_templates(),
            featured: default_featured(),
            assets: default_assets(),
        }
    }
}

impl PathsConfig {
    /// Return a copy with every relative path joined onto `base_path`.
    pub fn resolve(&self, base_path: &Path) -> Self {
        Self {
            studies: resolve_path(base_path, &self.studies),
            templates: resolve_path(base_path, &self.templates),
            featured: resolve_path(base_path, &self.featured),
            assets: resolve_path(base_path, &self.assets),
        }
    }
}

/// Resolve a relative path against a base path
pub fn resolve_path(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "smart_punctuation".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Labels
// =============================================================================

/// Fixed strings baked into generated pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_toc_title")]
    pub toc_title: String,
    #[serde(default = "default_featured_title")]
    pub featured_title: String,
    /// Prepended to the study title to form the page description
    #[serde(default = "default_description_prefix")]
    pub description_prefix: String,
}

fn default_toc_title() -> String {
    "📑 Índice".to_string()
}

fn default_featured_title() -> String {
    "⭐ Destaques".to_string()
}

fn default_description_prefix() -> String {
    "Estudo sobre".to_string()
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            toc_title: default_toc_title(),
            featured_title: default_featured_title(),
            description_prefix: default_description_prefix(),
        }
    }
}
