mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "zfocus", about = "Microscope z-focus scoring and search")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score images with one or all focus metrics
    Score(commands::score::ScoreArgs),
    /// Run an autofocus search against a recorded z-stack
    Focus(commands::focus::FocusArgs),
    /// Print or save the default autofocus config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Score(args) => commands::score::run(args),
        Commands::Focus(args) => commands::focus::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
