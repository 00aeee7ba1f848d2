//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Patch Distributor - routes patch requests from an upstream source to per-kind consumers
#[derive(Parser, Debug)]
#[command(
    name = "patch-distributor",
    author,
    version,
    about = "Patch request distribution service",
    long_about = "Consumes patch request configs from an upstream source, validates them\n\
                  against the local cluster, and delivers each one to the consumer\n\
                  subscribed to its target kind."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PATCH_DISTRIBUTOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PATCH_DISTRIBUTOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the distributor until interrupted
    Run(RunArgs),

    /// Validate a settings file without running
    Validate(ValidateArgs),

    /// Decode and validate a single patch payload offline
    Check(CheckArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to settings file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "distributor.toml",
        env = "PATCH_DISTRIBUTOR_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the cluster name from settings
    #[arg(long, env = "PATCH_DISTRIBUTOR_CLUSTER")]
    pub cluster: Option<String>,

    /// Override the source directory from settings
    #[arg(long, env = "PATCH_DISTRIBUTOR_SOURCE_PATH")]
    pub source_path: Option<PathBuf>,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "PATCH_DISTRIBUTOR_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PATCH_DISTRIBUTOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to settings file to validate
    #[arg(short, long, default_value = "distributor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check` command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Patch request payload (JSON)
    #[arg(short, long)]
    pub payload: PathBuf,

    /// Local cluster name to validate against
    #[arg(long, env = "PATCH_DISTRIBUTOR_CLUSTER")]
    pub cluster: String,

    /// Supported target kinds (repeatable, default: deployment)
    #[arg(long = "kind")]
    pub kinds: Vec<String>,

    /// Output result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
