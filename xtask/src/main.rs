//! Development tasks for the Conflux workspace.
//!
//! Usage:
//!   cargo xtask check-graphs <dir>    Validate every graph under a directory

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod check_graphs;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Conflux development tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, flatten, and validate every graph file under a directory
    CheckGraphs {
        /// Directory to walk for `.fbp`/`.json` graph files
        dir: PathBuf,

        /// Library index to validate against
        #[arg(long, default_value = "library.json")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckGraphs { dir, file } => check_graphs::run(dir, file)?,
    }

    Ok(())
}
