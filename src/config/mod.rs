//! Configuration loading and types for studysite.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

pub use types::{Config, LabelsConfig, MarkdownConfig, PathsConfig, resolve_path};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "studysite.yaml";

/// Prefix for environment variable overrides (`STUDYSITE__SITE__OUTPUT=dist`).
pub const ENV_PREFIX: &str = "STUDYSITE";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {}", .0.display())]
    EncodePath(std::path::PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),
}
