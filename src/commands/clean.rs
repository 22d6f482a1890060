use crate::{CleanArgs, build::Builder};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let (config, base_path) = super::load_project(args.config_file.as_deref())?;

    let builder = Builder::new(config, base_path);
    builder.check_output_dir()?;

    let output_dir = builder.output_dir();
    let display_path = output_dir.canonicalize().unwrap_or(output_dir.clone());

    if !output_dir.exists() {
        log!("clean"; "nothing to delete at {}", display_path.display());
        return Ok(());
    }

    if args.dry_run {
        log!("clean"; "would delete {}", display_path.display());
    } else {
        tokio::fs::remove_dir_all(&output_dir).await?;
        log!("clean"; "deleted {}", display_path.display());
    }

    Ok(())
}
