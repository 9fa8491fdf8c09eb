//! CLI module graph.

pub mod check;
pub mod command;
pub mod config;
pub mod output;
pub mod paths;
pub mod watch;

use command::{CheckCommand, Cli, ColorChoice, Commands, ConfigCommand};
use output::OutputConfig;

use crate::error::Result;

/// Apply global flags: color override and output mode.
pub fn apply_global_flags(cli: &Cli) {
    match cli.color {
        ColorChoice::Auto => owo_colors::unset_override(),
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));
}

/// Dispatch a parsed command line to its handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Watch(args) => watch::execute(&args).await,
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&args.path, args.force),
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(&args.config),
        Commands::Check(CheckCommand::Config(args)) => check::config::execute_config(&args.config),
        Commands::Check(CheckCommand::Connection(args)) => {
            check::connection::execute_connection(&args).await
        }
    }
}
