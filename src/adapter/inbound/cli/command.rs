//! Command-line interface definitions.
//!
//! Defines the CLI structure for the eegwatch application using `clap`.
//! The CLI supports subcommands for watching a patient's live feed,
//! managing configuration, and performing diagnostic checks.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::paths;
use crate::domain::PatientId;

/// Realtime EEG telemetry monitor
#[derive(Parser, Debug)]
#[command(name = "eegwatch")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the eegwatch CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a patient's live feed (foreground)
    Watch(WatchArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `eegwatch config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a new configuration file from template.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
}

/// Subcommands for `eegwatch check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file syntax and semantics.
    Config(ConfigPathArg),
    /// Test REST and stream connectivity to the server.
    Connection(ConnectionArgs),
}

/// Shared `--config` argument.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Arguments for `eegwatch watch`.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Patient whose live feed to subscribe to.
    #[arg(short, long)]
    pub patient: PatientId,

    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Stop after this many seconds (runs until Ctrl-C otherwise).
    #[arg(long)]
    pub duration: Option<u64>,
}

/// Arguments for `eegwatch check connection`.
#[derive(Parser, Debug)]
pub struct ConnectionArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Patient stream used for the handshake probe.
    #[arg(short, long, default_value = "1")]
    pub patient: PatientId,

    /// Per-probe timeout in seconds.
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for `eegwatch config init`.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the configuration file.
    #[arg(default_value_os_t = paths::default_config())]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(short, long)]
    pub force: bool,
}
