use std::path::{Path, PathBuf};

use crate::{InitArgs, config::{CONFIG_FILE_NAME, Config}};

const STUDY_TEMPLATE: &str = include_str!("scaffold/study.html");
const INDEX_TEMPLATE: &str = include_str!("scaffold/index.html");
const EXAMPLE_STUDY: &str = include_str!("scaffold/example-study.md");
const FEATURED_MANIFEST: &str = include_str!("scaffold/featured-studies.json");
const STYLESHEET: &str = include_str!("scaffold/style.css");
const BANNER: &str = include_str!("scaffold/banner.svg");

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    println!("Initializing project in {}", path.display());

    let config = Config::default();
    let config_text = serde_yaml::to_string(&config)?;

    for (file, content) in scaffold_files(&config, &config_text) {
        write_if_missing(&path, &file, content).await?;
    }

    Ok(())
}

/// Files of a new project, relative to its root.
fn scaffold_files<'a>(config: &Config, config_text: &'a str) -> Vec<(PathBuf, &'a str)> {
    let paths = &config.paths;
    vec![
        (PathBuf::from(CONFIG_FILE_NAME), config_text),
        (paths.templates.join("study.html"), STUDY_TEMPLATE),
        (paths.templates.join("index.html"), INDEX_TEMPLATE),
        (paths.studies.join("algoritmos/busca-binaria.md"), EXAMPLE_STUDY),
        (paths.featured.clone(), FEATURED_MANIFEST),
        (paths.assets.join("style.css"), STYLESHEET),
        (paths.assets.join("banner.svg"), BANNER),
    ]
}

async fn write_if_missing(root: &Path, file: &Path, content: &str) -> Result<(), anyhow::Error> {
    let target = root.join(file);
    if tokio::fs::try_exists(&target).await? {
        println!("Skipped {} (already exists)", target.display());
        return Ok(());
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, content).await?;
    println!("Created {}", target.display());
    Ok(())
}
