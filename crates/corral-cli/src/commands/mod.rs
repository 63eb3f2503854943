//! CLI command definitions and dispatch.

pub mod child;
pub mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Run a command in new namespaces under a pid limit.
#[derive(Parser, Debug)]
#[command(name = "corral", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON file with launch defaults; flags override its values.
    #[arg(long, global = true, env = "CORRAL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command inside new mount, UTS, and PID namespaces.
    Run(run::RunArgs),
    /// Second stage of `run`, reached through the self re-exec.
    #[command(hide = true)]
    Child(child::ChildArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Run(args) => run::execute(args, cli.config.as_deref()),
        Command::Child(args) => child::execute(args),
    }
}

/// Splits a parsed command line into the target and its arguments.
///
/// clap guarantees at least one token; an empty target left by a missing
/// one is rejected by `LaunchRequest::new`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn split_command(command: Vec<String>) -> (String, Vec<String>) {
    let mut tokens = command.into_iter();
    let target = tokens.next().unwrap_or_default();
    (target, tokens.collect())
}
