use crate::{BuildArgs, build::Builder};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let (config, base_path) = super::load_project(args.config_file.as_deref())?;

    let builder = Builder::new(config, base_path);
    let result = builder.build().await?;

    println!(
        "Built site to {} ({} studies, {} assets)",
        result.output_dir.display(),
        result.studies.len(),
        result.assets
    );

    // Per-file failures are reported but don't fail the build
    if !result.failed.is_empty() {
        println!("Skipped {} file(s):", result.failed.len());
        for failed in &result.failed {
            println!("  - {}: {}", failed.path.display(), failed.error);
        }
    }

    Ok(())
}
