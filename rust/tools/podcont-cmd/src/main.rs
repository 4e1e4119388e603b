use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod track;
mod utils;

#[derive(Parser)]
#[command(name = "podcont-cmd")]
#[command(about = "Command-line utility for contiguous container images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a track container, round-trip it through image files and write an event stream
    Demo {
        /// Number of fill iterations (each adds two tracks)
        #[arg(short, long, default_value_t = 10)]
        count: usize,

        /// Number of event snapshots written to the image stream
        #[arg(short, long, default_value_t = 1000)]
        events: usize,

        /// Output directory for the generated files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Inspect a track container image file and display its header
    Inspect {
        /// Number of leading elements to print
        #[arg(short, long, default_value_t = 0)]
        show: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Image file path
        file: PathBuf,
    },

    /// Validate an image stream and display record statistics
    StreamInfo {
        /// Increase verbosity (-v lists every record)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Image stream path
        file: PathBuf,
    },
}

/// Used when `RUST_LOG` is unset; covers the container and its I/O crate.
const DEFAULT_LOG_FILTER: &str = "info,podcont=debug,podcont_io=debug";

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { count, events, dir } => commands::demo::run(count, events, dir),
        Commands::Inspect { show, json, file } => commands::inspect::run(show, json, file),
        Commands::StreamInfo { verbose, file } => commands::stream_info::run(verbose, file),
    }
}
