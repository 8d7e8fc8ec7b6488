//! statepath - path enumeration and test sync for state machines
//!
//! Reads a flattened state graph (JSON or YAML), enumerates its test paths
//! and keeps a manifest of generated tests in sync with the graph.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use statepath_paths::HashAlgorithm;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statepath")]
#[command(about = "Enumerate state machine paths and sync generated tests")]
#[command(version)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, env = "STATEPATH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Enumeration overrides shared by every graph command.
#[derive(clap::Args, Debug, Default)]
pub struct EnumerationArgs {
    /// Maximum times a path may enter the same state
    #[arg(long)]
    max_visits: Option<usize>,

    /// Maximum number of transitions per path
    #[arg(long)]
    max_depth: Option<usize>,

    /// Path hash algorithm (crc16 or crc32)
    #[arg(long)]
    hash: Option<HashAlgorithm>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the states and edges of a graph
    Show {
        /// Graph file (.json, .yaml or .yml)
        graph: PathBuf,
    },

    /// List the test cases enumerated from a graph
    Enumerate {
        /// Graph file (.json, .yaml or .yml)
        graph: PathBuf,

        #[command(flatten)]
        limits: EnumerationArgs,

        /// Print test cases as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify the manifest against a graph and apply the changes
    Sync {
        /// Graph file (.json, .yaml or .yml)
        graph: PathBuf,

        #[command(flatten)]
        limits: EnumerationArgs,

        /// Manifest of previously generated tests
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Report what would change without writing the manifest
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the effective configuration to a YAML file
    Init {
        /// Output path
        #[arg(default_value = "statepath.yaml")]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load_from(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match commands::execute(cli.command, config) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}
