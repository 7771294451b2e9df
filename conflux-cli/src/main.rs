//! `conflux`: load and run flow-based graphs, and manage the component
//! library they draw processes from.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "conflux")]
#[command(author, version, about = "Flow-based process graph runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and execute a graph
    Run {
        /// FBP or JSON graph file to load
        #[arg(value_name = "GRAPH_FILE")]
        graph_file: PathBuf,

        /// Path to the component library index
        #[arg(long, default_value = "library.json")]
        file: PathBuf,

        /// Starting TCP port for endpoint allocation
        #[arg(long, default_value = "5000")]
        port: u16,

        /// Parse and validate only; do not spawn any process
        #[arg(long)]
        dry: bool,

        /// Verbose logging and `--debug` on every spawned child
        #[arg(long)]
        debug: bool,
    },

    /// Manage the component library
    Library {
        #[command(subcommand)]
        action: LibraryCommands,
    },
}

#[derive(Subcommand)]
enum LibraryCommands {
    /// Register an elementary executable or subgraph file, or recursively
    /// walk a directory of them
    Add {
        /// Path to an executable, a subgraph file, or a directory
        path: PathBuf,

        /// Path to the component library index
        #[arg(long, default_value = "library.json")]
        file: PathBuf,

        /// Name to register a single file under (ignored when walking a directory)
        #[arg(long)]
        name: Option<String>,

        /// Overwrite an existing entry of the same name
        #[arg(long)]
        force: bool,
    },

    /// List every registered component
    List {
        #[arg(long, default_value = "library.json")]
        file: PathBuf,
    },

    /// Show one component's full entry
    Info {
        name: String,

        #[arg(long, default_value = "library.json")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    match cli.command {
        Commands::Run {
            graph_file,
            file,
            port,
            dry,
            debug,
        } => {
            let exit_code = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(commands::run::run(&graph_file, &file, port, dry, debug))?;
            std::process::exit(exit_code);
        }
        Commands::Library { action } => match action {
            LibraryCommands::Add { path, file, name, force } => {
                commands::library::add(&path, &file, name.as_deref(), force)?
            }
            LibraryCommands::List { file } => commands::library::list(&file)?,
            LibraryCommands::Info { name, file } => commands::library::info(&name, &file)?,
        },
    }

    Ok(())
}
