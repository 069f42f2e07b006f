use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use relata_config::FileFormat;
use tracing_subscriber::EnvFilter;

mod commands;
mod utils;
use commands::{cmd_check, cmd_init, cmd_new, cmd_run, cmd_schema, cmd_status};

/// relata command-line interface.
#[derive(Parser, Debug)]
#[command(name = "relata", author, version, about)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG applies otherwise.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize relata.json with defaults.
    Init,
    /// Create a model template in the models directory.
    New {
        /// Entity name, cased per the configured entity naming case.
        name: String,
        /// Model file format (defaults to the configured model format).
        #[arg(short = 'f', long = "format", value_enum)]
        format: Option<FileFormat>,
    },
    /// Show configuration, models and stored rows.
    Status,
    /// Validate models and list every resolved relation.
    Check,
    /// Execute a JSON script of operations against the data file.
    Run {
        script: PathBuf,
        /// Print results without saving the data file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the JSON Schema of model files.
    Schema,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init => cmd_init(),
        Commands::New { name, format } => cmd_new(name, format),
        Commands::Status => cmd_status(),
        Commands::Check => cmd_check(),
        Commands::Run { script, dry_run } => cmd_run(script, dry_run),
        Commands::Schema => cmd_schema(),
    }
}
