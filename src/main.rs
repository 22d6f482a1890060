use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[macro_use]
mod log;

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: StudysiteCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "studysite.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "studysite.yaml")]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// The port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// The path to the configuration file
    #[arg(short, long, default_value = "studysite.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum StudysiteCommand {
    /// Create a new study site with example content
    Init(InitArgs),

    /// Build the site
    Build(BuildArgs),

    /// Delete the generated site
    Clean(CleanArgs),

    /// Build the site and serve it on a local port
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    match args.command {
        StudysiteCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        StudysiteCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        StudysiteCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
        StudysiteCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
    }

    Ok(())
}
