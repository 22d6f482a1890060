use std::path::{Path, PathBuf};

use crate::build::base_path_from_config;
use crate::config::Config;

pub mod build;
pub mod clean;
pub mod init;
pub mod serve;

/// Load the configuration named on the command line.
///
/// Returns the config and the directory relative paths resolve against.
fn load_project(config_file: Option<&Path>) -> Result<(Config, PathBuf), anyhow::Error> {
    let config_path = Config::path_from_arg(config_file)?;
    let config = Config::load_from_file(&config_path)?;
    Ok((config, base_path_from_config(&config_path)))
}
