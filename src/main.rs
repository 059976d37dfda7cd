//! Binary entry point for mediasnap.
//!
//! Exports datasets of the local catalog to snapshot directories and imports
//! snapshots back into them.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use mediasnap::config::MediasnapConfig;
use mediasnap::observability::{self, LoggingConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use commands::{DatasetAction, ExportArgs, ImportArgs};

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "MEDIASNAP_CONFIG_PATH";

/// mediasnap - portable snapshots of media datasets.
#[derive(Parser)]
#[command(name = "mediasnap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export a dataset to a snapshot directory.
    Export(ExportArgs),

    /// Import a snapshot directory into a dataset.
    Import(ImportArgs),

    /// Manage datasets.
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Export(args) => commands::cmd_export(&config, args),
        Commands::Import(args) => commands::cmd_import(&config, args),
        Commands::Dataset { action } => commands::cmd_dataset(&config, action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration.
fn load_config(path: Option<&Path>) -> mediasnap::Result<MediasnapConfig> {
    if let Some(config_path) = path {
        return MediasnapConfig::load_from_file(config_path);
    }

    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        if !config_path.trim().is_empty() {
            return MediasnapConfig::load_from_file(Path::new(&config_path));
        }
    }

    Ok(MediasnapConfig::load_default())
}
